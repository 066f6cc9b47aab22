use serde_json::json;

use crate::common::{ADMIN_PASSWORD, ADMIN_USERNAME, DEFAULT_PASSWORD, TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn bootstrap_admin_can_log_in() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["role"], "admin");
        assert_eq!(res.body["username"], ADMIN_USERNAME);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "username": ADMIN_USERNAME, "password": "not-the-password" }),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_username_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "username": "nobody", "password": "whatever1" }),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn login_resolves_the_principal_table_role() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        app.create_teacher(&admin, "t_hargreaves").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "username": "t_hargreaves", "password": DEFAULT_PASSWORD }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "teacher");
    }
}

mod me {
    use super::*;

    #[tokio::test]
    async fn me_reports_the_token_identity() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["role"], "admin");
        assert_eq!(res.body["username"], ADMIN_USERNAME);
    }

    #[tokio::test]
    async fn missing_token_resolves_to_role_none_not_an_error() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["role"], "none");
        assert!(res.body["id"].is_null());
    }

    #[tokio::test]
    async fn garbage_token_resolves_to_role_none_not_an_error() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["role"], "none");
    }

    #[tokio::test]
    async fn anonymous_viewer_gets_empty_lists_and_no_writes() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let teacher_id = app.create_teacher(&admin, "t_visible").await;
        app.teaching_graph(&admin, teacher_id, "1A", "History")
            .await;

        let list = app.get_without_token(routes::TEACHERS).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body["pagination"]["total"], 0);
        assert_eq!(list.body["data"].as_array().unwrap().len(), 0);

        let write = app
            .post_without_token(routes::CLASSES, &json!({ "name": "9Z", "capacity": 10, "grade_id": 1 }))
            .await;
        assert_eq!(write.status, 403);
        assert_eq!(write.body["code"], "PERMISSION_DENIED");
    }
}
