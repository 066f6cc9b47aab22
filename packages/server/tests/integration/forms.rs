use crate::common::{DEFAULT_PASSWORD, TestApp, routes};

mod access {
    use super::*;

    #[tokio::test]
    async fn unknown_entity_tags_are_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .get_with_token(&routes::form_options("grade"), &admin)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn roles_without_form_capability_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let class_id = app.create_class(&admin, "6A").await;
        let parent_id = app.create_parent(&admin, "p_forms").await;
        app.create_student(&admin, "s_forms", class_id, parent_id)
            .await;

        let student_token = app.login("s_forms", DEFAULT_PASSWORD).await;
        let res = app
            .get_with_token(&routes::form_options("exam"), &student_token)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        // Teachers cannot open admin-only forms either.
        let teacher_id = app.create_teacher(&admin, "t_forms").await;
        app.teaching_graph(&admin, teacher_id, "6B", "Drama").await;
        let teacher_token = app.login("t_forms", DEFAULT_PASSWORD).await;
        let res = app
            .get_with_token(&routes::form_options("announcement"), &teacher_token)
            .await;
        assert_eq!(res.status, 403);
    }
}

mod reference_data {
    use super::*;

    #[tokio::test]
    async fn student_form_gets_grades_classes_and_parents() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_class(&admin, "7A").await;
        app.create_parent(&admin, "p_lookup").await;

        let res = app
            .get_with_token(&routes::form_options("student"), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["grades"].as_array().unwrap().len(), 6);
        assert_eq!(res.body["classes"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["parents"].as_array().unwrap().len(), 1);
        // Only the registered lists are present.
        assert!(res.body.get("lessons").is_none());
        assert!(res.body.get("teachers").is_none());
    }

    #[tokio::test]
    async fn exam_form_lessons_are_scoped_to_the_acting_teacher() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let t1_id = app.create_teacher(&admin, "t_scoped").await;
        let t2_id = app.create_teacher(&admin, "t_unscoped").await;
        let (_, _, own_lesson) = app.teaching_graph(&admin, t1_id, "8A", "Art").await;
        app.teaching_graph(&admin, t2_id, "8B", "Gym").await;

        let token = app.login("t_scoped", DEFAULT_PASSWORD).await;
        let res = app.get_with_token(&routes::form_options("exam"), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let lessons = res.body["lessons"].as_array().unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0]["id"].as_i64().unwrap() as i32, own_lesson);

        // The admin sees every lesson in the same dropdown.
        let admin_res = app
            .get_with_token(&routes::form_options("exam"), &admin)
            .await;
        assert_eq!(admin_res.body["lessons"].as_array().unwrap().len(), 2);
    }
}
