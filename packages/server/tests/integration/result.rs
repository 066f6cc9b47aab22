use serde_json::json;

use crate::common::{DEFAULT_PASSWORD, TestApp, routes};

/// Admin plus a teacher with a lesson, an exam, an assignment and a student.
struct Graph {
    admin: String,
    teacher_token: String,
    student_id: i32,
    exam_id: i32,
    assignment_id: i32,
    foreign_exam_id: i32,
}

async fn graph(app: &TestApp) -> Graph {
    let admin = app.admin_token().await;
    let t1_id = app.create_teacher(&admin, "t_grader").await;
    let t2_id = app.create_teacher(&admin, "t_other").await;
    let (class_id, _, lesson_id) = app.teaching_graph(&admin, t1_id, "4A", "Latin").await;
    let (_, _, foreign_lesson) = app.teaching_graph(&admin, t2_id, "4B", "Music").await;

    let parent_id = app.create_parent(&admin, "p_grader").await;
    let student_id = app
        .create_student(&admin, "s_graded", class_id, parent_id)
        .await;

    let exam_id = app.create_exam(&admin, "Latin Midterm", lesson_id).await;
    let foreign_exam_id = app.create_exam(&admin, "Music Quiz", foreign_lesson).await;

    let res = app
        .post_with_token(
            routes::ASSIGNMENTS,
            &json!({
                "title": "Latin Essay",
                "start_date": "2026-03-02T00:00:00Z",
                "due_date": "2026-03-16T00:00:00Z",
                "lesson_id": lesson_id,
            }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "create assignment failed: {}", res.text);
    let assignment_id = res.id();

    let teacher_token = app.login("t_grader", DEFAULT_PASSWORD).await;
    Graph {
        admin,
        teacher_token,
        student_id,
        exam_id,
        assignment_id,
        foreign_exam_id,
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn a_result_must_reference_exactly_one_target() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;

        let neither = app
            .post_with_token(
                routes::RESULTS,
                &json!({ "score": 80, "student_id": ctx.student_id }),
                &ctx.admin,
            )
            .await;
        assert_eq!(neither.status, 400);
        assert_eq!(neither.body["code"], "VALIDATION_ERROR");
        assert!(
            neither.body["message"].as_str().unwrap().contains("exam_id"),
            "message should name the field: {}",
            neither.text
        );

        let both = app
            .post_with_token(
                routes::RESULTS,
                &json!({
                    "score": 80,
                    "student_id": ctx.student_id,
                    "exam_id": ctx.exam_id,
                    "assignment_id": ctx.assignment_id,
                }),
                &ctx.admin,
            )
            .await;
        assert_eq!(both.status, 400);
        assert_eq!(both.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn scores_outside_the_bounds_are_rejected() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;

        for score in [-1, 101] {
            let res = app
                .post_with_token(
                    routes::RESULTS,
                    &json!({
                        "score": score,
                        "student_id": ctx.student_id,
                        "exam_id": ctx.exam_id,
                    }),
                    &ctx.admin,
                )
                .await;
            assert_eq!(res.status, 400, "score {score} should be rejected");
        }

        for score in [0, 100] {
            let res = app
                .post_with_token(
                    routes::RESULTS,
                    &json!({
                        "score": score,
                        "student_id": ctx.student_id,
                        "exam_id": ctx.exam_id,
                    }),
                    &ctx.admin,
                )
                .await;
            assert_eq!(res.status, 201, "score {score} should pass: {}", res.text);
        }
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn teacher_records_results_under_their_own_lessons_only() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;

        let own = app
            .post_with_token(
                routes::RESULTS,
                &json!({
                    "score": 92,
                    "student_id": ctx.student_id,
                    "exam_id": ctx.exam_id,
                }),
                &ctx.teacher_token,
            )
            .await;
        assert_eq!(own.status, 201, "{}", own.text);

        let foreign = app
            .post_with_token(
                routes::RESULTS,
                &json!({
                    "score": 92,
                    "student_id": ctx.student_id,
                    "exam_id": ctx.foreign_exam_id,
                }),
                &ctx.teacher_token,
            )
            .await;
        assert_eq!(foreign.status, 403);
        assert_eq!(foreign.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn student_sees_only_their_own_results() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;
        app.post_with_token(
            routes::RESULTS,
            &json!({ "score": 77, "student_id": ctx.student_id, "exam_id": ctx.exam_id }),
            &ctx.admin,
        )
        .await;

        let token = app.login("s_graded", DEFAULT_PASSWORD).await;
        let res = app.get_with_token(routes::RESULTS, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["score"], 77);
        assert_eq!(res.body["data"][0]["exam_title"], "Latin Midterm");
    }
}

mod updates {
    use super::*;

    #[tokio::test]
    async fn switching_target_keeps_the_exclusivity_invariant() {
        let app = TestApp::spawn().await;
        let ctx = graph(&app).await;
        let res = app
            .post_with_token(
                routes::RESULTS,
                &json!({ "score": 60, "student_id": ctx.student_id, "exam_id": ctx.exam_id }),
                &ctx.admin,
            )
            .await;
        assert_eq!(res.status, 201);
        let id = res.id();

        // Adding the assignment without clearing the exam would leave both.
        let bad = app
            .patch_with_token(
                &routes::result(id),
                &json!({ "assignment_id": ctx.assignment_id }),
                &ctx.admin,
            )
            .await;
        assert_eq!(bad.status, 400);
        assert_eq!(bad.body["code"], "VALIDATION_ERROR");

        // Swapping both fields in one payload is fine.
        let good = app
            .patch_with_token(
                &routes::result(id),
                &json!({ "exam_id": null, "assignment_id": ctx.assignment_id }),
                &ctx.admin,
            )
            .await;
        assert_eq!(good.status, 200, "{}", good.text);
        assert!(good.body["exam_id"].is_null());
        assert_eq!(good.body["assignment_id"], ctx.assignment_id);

        // Clearing both is rejected.
        let cleared = app
            .patch_with_token(
                &routes::result(id),
                &json!({ "assignment_id": null }),
                &ctx.admin,
            )
            .await;
        assert_eq!(cleared.status, 400);
    }
}
