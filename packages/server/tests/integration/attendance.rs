use serde_json::json;

use crate::common::{DEFAULT_PASSWORD, TestApp, routes};

/// Two teachers with disjoint classes, one student per class, and one
/// attendance row under each teacher's lesson.
struct Graph {
    admin: String,
    t1_token: String,
    t2_class: i32,
    s1_id: i32,
    s2_id: i32,
    t1_lesson: i32,
    t2_lesson: i32,
    t1_attendance: i32,
}

async fn graph(app: &TestApp) -> Graph {
    let admin = app.admin_token().await;
    let t1_id = app.create_teacher(&admin, "t_alpha").await;
    let t2_id = app.create_teacher(&admin, "t_beta").await;
    let (t1_class, _, t1_lesson) = app.teaching_graph(&admin, t1_id, "3A", "Chemistry").await;
    let (t2_class, _, t2_lesson) = app.teaching_graph(&admin, t2_id, "3B", "Geography").await;

    let p1 = app.create_parent(&admin, "p_alpha").await;
    let p2 = app.create_parent(&admin, "p_beta").await;
    let s1_id = app.create_student(&admin, "s_alpha", t1_class, p1).await;
    let s2_id = app.create_student(&admin, "s_beta", t2_class, p2).await;

    let t1_attendance = record(app, &admin, s1_id, t1_lesson).await;
    record(app, &admin, s2_id, t2_lesson).await;

    let t1_token = app.login("t_alpha", DEFAULT_PASSWORD).await;
    Graph {
        admin,
        t1_token,
        t2_class,
        s1_id,
        s2_id,
        t1_lesson,
        t2_lesson,
        t1_attendance,
    }
}

async fn record(app: &TestApp, token: &str, student_id: i32, lesson_id: i32) -> i32 {
    let res = app
        .post_with_token(
            routes::ATTENDANCE,
            &json!({
                "date": "2026-03-02",
                "present": true,
                "student_id": student_id,
                "lesson_id": lesson_id,
            }),
            token,
        )
        .await;
    assert_eq!(res.status, 201, "record attendance failed: {}", res.text);
    res.id()
}

mod scoping {
    use super::*;

    #[tokio::test]
    async fn teacher_sees_only_rows_under_their_own_lessons() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;

        let res = app.get_with_token(routes::ATTENDANCE, &ctx.t1_token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(
            res.body["data"][0]["id"].as_i64().unwrap() as i32,
            ctx.t1_attendance
        );
    }

    #[tokio::test]
    async fn a_foreign_class_id_parameter_cannot_widen_the_scope() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;

        // The other teacher's class has rows; the intersection with the
        // viewer's scope must still be empty.
        let res = app
            .get_with_token(
                &format!("{}?class_id={}", routes::ATTENDANCE, ctx.t2_class),
                &ctx.t1_token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 0);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);

        // The admin with the same parameter does see the row.
        let admin_view = app
            .get_with_token(
                &format!("{}?class_id={}", routes::ATTENDANCE, ctx.t2_class),
                &ctx.admin,
            )
            .await;
        assert_eq!(admin_view.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn a_parent_sees_only_their_childrens_rows() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;

        let parent_token = app.login("p_alpha", DEFAULT_PASSWORD).await;
        let res = app.get_with_token(routes::ATTENDANCE, &parent_token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["student_surname"], "Student");
        assert_eq!(
            res.body["data"][0]["id"].as_i64().unwrap() as i32,
            ctx.t1_attendance
        );
    }

    #[tokio::test]
    async fn a_student_sees_only_their_own_rows() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;

        let student_token = app.login("s_beta", DEFAULT_PASSWORD).await;
        let res = app.get_with_token(routes::ATTENDANCE, &student_token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
    }
}

mod writes {
    use super::*;

    #[tokio::test]
    async fn teacher_records_attendance_for_their_own_lesson() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;

        let res = app
            .post_with_token(
                routes::ATTENDANCE,
                &json!({
                    "date": "2026-03-03",
                    "present": false,
                    "student_id": ctx.s1_id,
                    "lesson_id": ctx.t1_lesson,
                }),
                &ctx.t1_token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["present"], false);
    }

    #[tokio::test]
    async fn teacher_cannot_record_attendance_for_a_foreign_lesson() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;

        let res = app
            .post_with_token(
                routes::ATTENDANCE,
                &json!({
                    "date": "2026-03-03",
                    "present": true,
                    "student_id": ctx.s2_id,
                    "lesson_id": ctx.t2_lesson,
                }),
                &ctx.t1_token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn list_rows_carry_the_joined_display_fields() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;

        let res = app.get_with_token(routes::ATTENDANCE, &ctx.t1_token).await;
        let row = &res.body["data"][0];

        assert_eq!(row["class_name"], "3A");
        assert_eq!(row["student_name"], "Test");
        assert!(row["lesson_name"].is_string());
    }
}
