use serde_json::json;

use crate::common::{DEFAULT_PASSWORD, TestApp, routes};

async fn create_event(
    app: &TestApp,
    token: &str,
    title: &str,
    start: &str,
    end: &str,
    class_id: Option<i32>,
) -> crate::common::TestResponse {
    app.post_with_token(
        routes::EVENTS,
        &json!({
            "title": title,
            "description": "An event",
            "start_time": start,
            "end_time": end,
            "class_id": class_id,
        }),
        token,
    )
    .await
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn end_time_must_be_strictly_after_start_time() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let backwards = create_event(
            &app,
            &admin,
            "Backwards",
            "2026-05-01T12:00:00Z",
            "2026-05-01T11:00:00Z",
            None,
        )
        .await;
        assert_eq!(backwards.status, 400);
        assert_eq!(backwards.body["code"], "VALIDATION_ERROR");

        let zero_length = create_event(
            &app,
            &admin,
            "Instant",
            "2026-05-01T12:00:00Z",
            "2026-05-01T12:00:00Z",
            None,
        )
        .await;
        assert_eq!(zero_length.status, 400);

        let ok = create_event(
            &app,
            &admin,
            "Sports Day",
            "2026-05-01T12:00:00Z",
            "2026-05-01T15:00:00Z",
            None,
        )
        .await;
        assert_eq!(ok.status, 201, "{}", ok.text);
    }

    #[tokio::test]
    async fn update_cannot_break_the_window_via_one_bound() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let created = create_event(
            &app,
            &admin,
            "Concert",
            "2026-05-02T18:00:00Z",
            "2026-05-02T20:00:00Z",
            None,
        )
        .await;
        assert_eq!(created.status, 201);
        let id = created.id();

        let res = app
            .patch_with_token(
                &format!("{}/{}", routes::EVENTS, id),
                &json!({ "start_time": "2026-05-02T21:00:00Z" }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod calendar {
    use super::*;

    #[tokio::test]
    async fn date_filter_returns_only_that_days_events() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        create_event(
            &app,
            &admin,
            "Day One",
            "2026-05-04T09:00:00Z",
            "2026-05-04T10:00:00Z",
            None,
        )
        .await;
        create_event(
            &app,
            &admin,
            "Day Two",
            "2026-05-05T09:00:00Z",
            "2026-05-05T10:00:00Z",
            None,
        )
        .await;

        let res = app
            .get_with_token(&format!("{}?date=2026-05-04", routes::EVENTS), &admin)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["title"], "Day One");
    }

    #[tokio::test]
    async fn students_see_global_and_own_class_events_only() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let own_class = app.create_class(&admin, "5A").await;
        let other_class = app.create_class(&admin, "5B").await;
        let parent_id = app.create_parent(&admin, "p_events").await;
        app.create_student(&admin, "s_events", own_class, parent_id)
            .await;

        create_event(
            &app,
            &admin,
            "School Fair",
            "2026-05-06T09:00:00Z",
            "2026-05-06T17:00:00Z",
            None,
        )
        .await;
        create_event(
            &app,
            &admin,
            "Own Class Trip",
            "2026-05-07T09:00:00Z",
            "2026-05-07T17:00:00Z",
            Some(own_class),
        )
        .await;
        create_event(
            &app,
            &admin,
            "Other Class Trip",
            "2026-05-08T09:00:00Z",
            "2026-05-08T17:00:00Z",
            Some(other_class),
        )
        .await;

        let token = app.login("s_events", DEFAULT_PASSWORD).await;
        let res = app.get_with_token(routes::EVENTS, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 2);
        let titles: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["title"].as_str().unwrap())
            .collect();
        assert!(titles.contains(&"School Fair"));
        assert!(titles.contains(&"Own Class Trip"));
        assert!(!titles.contains(&"Other Class Trip"));
    }
}
