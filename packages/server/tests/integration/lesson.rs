use serde_json::json;

use crate::common::{DEFAULT_PASSWORD, TestApp, routes};

/// Admin token plus two teachers with their own classes/subjects/lessons.
struct TwoTeachers {
    admin: String,
    t1_id: i32,
    t2_id: i32,
    t1_token: String,
    t1_lesson: i32,
    t2_lesson: i32,
    subject_id: i32,
    class_id: i32,
}

async fn two_teachers(app: &TestApp) -> TwoTeachers {
    let admin = app.admin_token().await;
    let t1_id = app.create_teacher(&admin, "t_one").await;
    let t2_id = app.create_teacher(&admin, "t_two").await;
    let (class_id, subject_id, t1_lesson) =
        app.teaching_graph(&admin, t1_id, "2A", "Algebra").await;
    let (_, _, t2_lesson) = app.teaching_graph(&admin, t2_id, "2B", "Biology").await;
    let t1_token = app.login("t_one", DEFAULT_PASSWORD).await;
    TwoTeachers {
        admin,
        t1_id,
        t2_id,
        t1_token,
        t1_lesson,
        t2_lesson,
        subject_id,
        class_id,
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn teacher_can_create_a_lesson_for_themself() {
        let app = TestApp::spawn().await;
        let ctx = two_teachers(&app).await;

        let res = app
            .post_with_token(
                routes::LESSONS,
                &json!({
                    "name": "Algebra II",
                    "start_time": "2026-03-03T08:00:00Z",
                    "end_time": "2026-03-03T09:00:00Z",
                    "subject_id": ctx.subject_id,
                    "class_id": ctx.class_id,
                    "teacher_id": ctx.t1_id,
                }),
                &ctx.t1_token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["teacher_id"], ctx.t1_id);
    }

    #[tokio::test]
    async fn teacher_cannot_create_a_lesson_for_someone_else() {
        let app = TestApp::spawn().await;
        let ctx = two_teachers(&app).await;

        let res = app
            .post_with_token(
                routes::LESSONS,
                &json!({
                    "name": "Hijacked",
                    "start_time": "2026-03-03T08:00:00Z",
                    "end_time": "2026-03-03T09:00:00Z",
                    "subject_id": ctx.subject_id,
                    "class_id": ctx.class_id,
                    "teacher_id": ctx.t2_id,
                }),
                &ctx.t1_token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn end_time_must_be_after_start_time() {
        let app = TestApp::spawn().await;
        let ctx = two_teachers(&app).await;

        let res = app
            .post_with_token(
                routes::LESSONS,
                &json!({
                    "name": "Backwards",
                    "start_time": "2026-03-03T09:00:00Z",
                    "end_time": "2026-03-03T08:00:00Z",
                    "subject_id": ctx.subject_id,
                    "class_id": ctx.class_id,
                    "teacher_id": ctx.t1_id,
                }),
                &ctx.admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod updates {
    use super::*;

    #[tokio::test]
    async fn window_is_revalidated_against_stored_values() {
        let app = TestApp::spawn().await;
        let ctx = two_teachers(&app).await;

        // Stored start is 08:00; moving only the end before it must fail.
        let res = app
            .patch_with_token(
                &routes::lesson(ctx.t1_lesson),
                &json!({ "end_time": "2026-03-02T07:00:00Z" }),
                &ctx.admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn teacher_cannot_update_another_teachers_lesson() {
        let app = TestApp::spawn().await;
        let ctx = two_teachers(&app).await;

        let res = app
            .patch_with_token(
                &routes::lesson(ctx.t2_lesson),
                &json!({ "name": "Taken over" }),
                &ctx.t1_token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn lesson_with_exams_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let ctx = two_teachers(&app).await;
        app.create_exam(&ctx.admin, "Midterm", ctx.t1_lesson).await;

        let res = app
            .delete_with_token(&routes::lesson(ctx.t1_lesson), &ctx.admin)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn teacher_can_delete_their_own_bare_lesson() {
        let app = TestApp::spawn().await;
        let ctx = two_teachers(&app).await;

        let res = app
            .delete_with_token(&routes::lesson(ctx.t1_lesson), &ctx.t1_token)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let gone = app
            .get_with_token(&routes::lesson(ctx.t1_lesson), &ctx.admin)
            .await;
        assert_eq!(gone.status, 404);
    }

    #[tokio::test]
    async fn teacher_cannot_delete_another_teachers_lesson() {
        let app = TestApp::spawn().await;
        let ctx = two_teachers(&app).await;

        let res = app
            .delete_with_token(&routes::lesson(ctx.t2_lesson), &ctx.t1_token)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn teacher_sees_only_their_own_lessons() {
        let app = TestApp::spawn().await;
        let ctx = two_teachers(&app).await;

        let res = app.get_with_token(routes::LESSONS, &ctx.t1_token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(
            res.body["data"][0]["id"].as_i64().unwrap() as i32,
            ctx.t1_lesson
        );
    }

    #[tokio::test]
    async fn list_rows_carry_the_joined_display_fields() {
        let app = TestApp::spawn().await;
        let ctx = two_teachers(&app).await;

        let res = app.get_with_token(routes::LESSONS, &ctx.t1_token).await;

        let row = &res.body["data"][0];
        assert_eq!(row["subject_name"], "Algebra");
        assert_eq!(row["class_name"], "2A");
        assert_eq!(row["teacher_surname"], "Teacher");
    }
}
