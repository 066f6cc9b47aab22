use serde_json::json;

use crate::common::{DEFAULT_PASSWORD, TestApp, routes};

/// Create the admin token plus a parent and class to hang students off.
async fn setup(app: &TestApp) -> (String, i32, i32) {
    let admin = app.admin_token().await;
    let parent_id = app.create_parent(&admin, "p_setup").await;
    let class_id = app.create_class(&admin, "1A").await;
    (admin, parent_id, class_id)
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn create_then_fetch_round_trips() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;
        let grade_id = app.grade_id(1).await;

        let res = app
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "username": "s_magnus",
                    "password": DEFAULT_PASSWORD,
                    "name": "Magnus",
                    "surname": "Holm",
                    "email": "magnus@example.com",
                    "address": "4 Dorm Street",
                    "blood_type": "B+",
                    "sex": "Male",
                    "birthday": "2011-02-03",
                    "grade_id": grade_id,
                    "class_id": class_id,
                    "parent_id": parent_id,
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let id = res.id();

        let fetched = app.get_with_token(&routes::student(id), &admin).await;
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.body["username"], "s_magnus");
        assert_eq!(fetched.body["name"], "Magnus");
        assert_eq!(fetched.body["surname"], "Holm");
        assert_eq!(fetched.body["email"], "magnus@example.com");
        assert_eq!(fetched.body["birthday"], "2011-02-03");
        assert_eq!(fetched.body["class_id"], class_id);
        assert_eq!(fetched.body["parent_id"], parent_id);
        // The password never comes back.
        assert!(fetched.body.get("password").is_none());
        assert!(fetched.body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn username_length_is_validated() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;
        let grade_id = app.grade_id(1).await;

        for username in ["ab", "a".repeat(21).as_str()] {
            let res = app
                .post_with_token(
                    routes::STUDENTS,
                    &json!({
                        "username": username,
                        "password": DEFAULT_PASSWORD,
                        "name": "Short",
                        "surname": "Name",
                        "address": "x",
                        "blood_type": "A+",
                        "sex": "Male",
                        "birthday": "2011-02-03",
                        "grade_id": grade_id,
                        "class_id": class_id,
                        "parent_id": parent_id,
                    }),
                    &admin,
                )
                .await;
            assert_eq!(res.status, 400, "username {username:?} should be rejected");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;
        let grade_id = app.grade_id(1).await;

        let res = app
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "username": "s_shortpw",
                    "password": "short",
                    "name": "S",
                    "surname": "P",
                    "address": "x",
                    "blood_type": "A+",
                    "sex": "Female",
                    "birthday": "2011-02-03",
                    "grade_id": grade_id,
                    "class_id": class_id,
                    "parent_id": parent_id,
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;

        app.create_student(&admin, "s_twice", class_id, parent_id)
            .await;
        let grade_id = app.grade_id(1).await;
        let res = app
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "username": "s_twice",
                    "password": DEFAULT_PASSWORD,
                    "name": "Second",
                    "surname": "Copy",
                    "address": "x",
                    "blood_type": "A+",
                    "sex": "Male",
                    "birthday": "2011-02-03",
                    "grade_id": grade_id,
                    "class_id": class_id,
                    "parent_id": parent_id,
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn dangling_class_reference_conflicts() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, _class_id) = setup(&app).await;
        let grade_id = app.grade_id(1).await;

        let res = app
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "username": "s_dangling",
                    "password": DEFAULT_PASSWORD,
                    "name": "No",
                    "surname": "Class",
                    "address": "x",
                    "blood_type": "A+",
                    "sex": "Male",
                    "birthday": "2011-02-03",
                    "grade_id": grade_id,
                    "class_id": 99999,
                    "parent_id": parent_id,
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod updates {
    use super::*;

    #[tokio::test]
    async fn empty_update_is_idempotent_success() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;
        let id = app
            .create_student(&admin, "s_same", class_id, parent_id)
            .await;

        let before = app.get_with_token(&routes::student(id), &admin).await;
        let res = app
            .patch_with_token(&routes::student(id), &json!({}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let after = app.get_with_token(&routes::student(id), &admin).await;

        assert_eq!(before.body, after.body);
    }

    #[tokio::test]
    async fn resubmitting_the_stored_values_produces_no_diff() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;
        let id = app
            .create_student(&admin, "s_noop", class_id, parent_id)
            .await;

        let before = app.get_with_token(&routes::student(id), &admin).await;
        let res = app
            .patch_with_token(
                &routes::student(id),
                &json!({ "name": "Test", "surname": "Student", "class_id": class_id }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let after = app.get_with_token(&routes::student(id), &admin).await;

        assert_eq!(before.body, after.body);
    }

    #[tokio::test]
    async fn empty_password_means_unchanged() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;
        let id = app
            .create_student(&admin, "s_keepspw", class_id, parent_id)
            .await;

        let res = app
            .patch_with_token(
                &routes::student(id),
                &json!({ "password": "", "name": "Renamed" }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        // The old password still logs in.
        app.login("s_keepspw", DEFAULT_PASSWORD).await;
    }

    #[tokio::test]
    async fn updating_a_vanished_student_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .patch_with_token(&routes::student(424242), &json!({ "name": "Ghost" }), &admin)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn pages_are_capped_and_the_total_is_exact() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;

        for i in 0..12 {
            app.create_student(&admin, &format!("s_page{i}"), class_id, parent_id)
                .await;
        }

        let page1 = app.get_with_token(routes::STUDENTS, &admin).await;
        assert_eq!(page1.status, 200);
        assert_eq!(page1.body["data"].as_array().unwrap().len(), 10);
        assert_eq!(page1.body["pagination"]["total"], 12);
        assert_eq!(page1.body["pagination"]["per_page"], 10);
        assert_eq!(page1.body["pagination"]["total_pages"], 2);

        let page2 = app
            .get_with_token(&format!("{}?page=2", routes::STUDENTS), &admin)
            .await;
        assert_eq!(page2.body["data"].as_array().unwrap().len(), 2);
        assert_eq!(page2.body["pagination"]["page"], 2);
    }

    #[tokio::test]
    async fn search_matches_name_case_insensitively() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;
        app.create_student(&admin, "s_findme", class_id, parent_id)
            .await;
        app.create_student(&admin, "s_other", class_id, parent_id)
            .await;

        let res = app
            .get_with_token(&format!("{}?search=FINDME", routes::STUDENTS), &admin)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["username"], "s_findme");
    }

    #[tokio::test]
    async fn a_student_sees_only_themself() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;
        app.create_student(&admin, "s_me", class_id, parent_id)
            .await;
        app.create_student(&admin, "s_classmate", class_id, parent_id)
            .await;

        let token = app.login("s_me", DEFAULT_PASSWORD).await;
        let res = app.get_with_token(routes::STUDENTS, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["username"], "s_me");
    }

    #[tokio::test]
    async fn teacher_results_are_a_subset_of_admin_results() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;
        let teacher_id = app.create_teacher(&admin, "t_subset").await;
        app.teaching_graph(&admin, teacher_id, "1B", "Physics")
            .await;

        // Students in the teacher's class (1A has no lesson by this teacher).
        app.create_student(&admin, "s_in_1a", class_id, parent_id)
            .await;

        let teacher_token = app.login("t_subset", DEFAULT_PASSWORD).await;
        let admin_rows = app.get_with_token(routes::STUDENTS, &admin).await;
        let teacher_rows = app.get_with_token(routes::STUDENTS, &teacher_token).await;

        let admin_ids: Vec<i64> = admin_rows.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["id"].as_i64().unwrap())
            .collect();
        for row in teacher_rows.body["data"].as_array().unwrap() {
            assert!(admin_ids.contains(&row["id"].as_i64().unwrap()));
        }
        assert!(
            teacher_rows.body["pagination"]["total"].as_u64()
                <= admin_rows.body["pagination"]["total"].as_u64()
        );
    }

    #[tokio::test]
    async fn writes_by_read_only_roles_are_rejected_server_side() {
        let app = TestApp::spawn().await;
        let (admin, parent_id, class_id) = setup(&app).await;
        app.create_student(&admin, "s_tries", class_id, parent_id)
            .await;
        let token = app.login("s_tries", DEFAULT_PASSWORD).await;
        let grade_id = app.grade_id(1).await;

        let res = app
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "username": "s_sneaky",
                    "password": DEFAULT_PASSWORD,
                    "name": "Sneaky",
                    "surname": "Write",
                    "address": "x",
                    "blood_type": "A+",
                    "sex": "Male",
                    "birthday": "2011-02-03",
                    "grade_id": grade_id,
                    "class_id": class_id,
                    "parent_id": parent_id,
                }),
                &token,
            )
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}
