#[cfg(test)]
mod integration_tests {
    use crate::handlers::auth::{LoginRequest, RegisterRequest, TokenPairResponse, VerificationResponse};
    use crate::handlers::contact_messages::{MessageRequest, MessageResponse, ReplyResponse};
    use crate::handlers::projects::ProjectResponse;
    use crate::handlers::users::UserListResponse;
    use crate::schemas::{ApiResponse, ErrorResponse, HealthResponse};
    use crate::test_utils::{
        bearer, seed_user, setup_test_app, setup_test_app_with_mailer, TestApp, PASSWORD,
    };
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use chrono::Utc;
    use model::entities::contact_message::MessageStatus;
    use model::entities::user;
    use notify::MemoryMailer;
    use sea_orm::{ActiveModelTrait, Set};
    use serde_json::json;

    fn server(app: &TestApp) -> TestServer {
        TestServer::new(app.router.clone()).unwrap()
    }

    fn login_request(identifier: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username_or_email: Some(identifier.to_string()),
            password: Some(password.to_string()),
        }
    }

    /// Pulls the token out of the last verification link that was emailed.
    fn verification_token(mailer: &MemoryMailer) -> String {
        let email = mailer
            .sent()
            .into_iter()
            .rev()
            .find(|email| email.subject.starts_with("Verify"))
            .expect("no verification email sent");
        let (_, rest) = email
            .text
            .split_once("/verify-email/")
            .expect("verification link missing");
        rest.split_whitespace().next().unwrap().to_string()
    }

    async fn register(server: &TestServer, username: &str, email: &str) {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            password_confirm: PASSWORD.to_string(),
            first_name: None,
            last_name: None,
        };
        server
            .post("/api/v1/auth/register/")
            .json(&request)
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = server(&app);

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.database, "connected");
    }

    #[tokio::test]
    async fn test_metrics_not_mounted_in_tests() {
        let app = setup_test_app().await;
        let server = server(&app);

        server
            .get("/metrics")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_registration_to_login() {
        let app = setup_test_app().await;
        let server = server(&app);
        let staff = seed_user(&app.state, "staff", true).await;

        register(&server, "alice", "alice@x.com").await;

        // Unverified accounts cannot log in yet
        let response = server
            .post("/api/v1/auth/login/")
            .json(&login_request("alice", PASSWORD))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "email_not_verified");

        let token = verification_token(&app.mailer);
        let response = server
            .get(&format!("/api/v1/auth/verify-email/{}/", token))
            .add_header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<VerificationResponse> = response.json();
        assert!(body.data.verified);
        assert_eq!(
            body.message,
            "Email verified successfully! Your account is pending admin approval."
        );

        // Verified but not approved
        let response = server
            .post("/api/v1/auth/login/")
            .json(&login_request("alice@x.com", PASSWORD))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "account_pending_approval");

        let alice_id = listed_user_id(&server, &app, &staff, "alice").await;
        let (name, value) = bearer(&app.state, &staff);
        server
            .patch(&format!("/api/v1/auth/users/{}/approval/", alice_id))
            .add_header(name, value)
            .json(&json!({ "is_approved": true }))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .post("/api/v1/auth/login/")
            .json(&login_request("alice@x.com", PASSWORD))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<TokenPairResponse> = response.json();
        assert!(!body.data.access.is_empty());
        assert!(!body.data.refresh.is_empty());

        // The access token works against an authenticated endpoint
        let response = server
            .get("/api/v1/auth/profile/")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", body.data.access)).unwrap(),
            )
            .await;
        response.assert_status(StatusCode::OK);
        let profile: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(profile.data["username_slug"], "alice");
    }

    async fn listed_user_id(
        server: &TestServer,
        app: &TestApp,
        staff: &user::Model,
        username: &str,
    ) -> i64 {
        let (name, value) = bearer(&app.state, staff);
        let response = server
            .get("/api/v1/auth/users/")
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        body.data["results"]
            .as_array()
            .unwrap()
            .iter()
            .find(|item| item["username"] == username)
            .and_then(|item| item["id"].as_i64())
            .expect("user not listed")
    }

    #[tokio::test]
    async fn test_verification_link_is_single_use() {
        let app = setup_test_app().await;
        let server = server(&app);

        register(&server, "carol", "carol@x.com").await;
        let token = verification_token(&app.mailer);
        let path = format!("/api/v1/auth/verify-email/{}/", token);

        server
            .get(&path)
            .add_header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .get(&path)
            .add_header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<VerificationResponse> = response.json();
        assert!(!body.data.verified);
        assert!(body.data.already_used);

        // Browsers get an HTML page instead
        let response = server.get(&path).await;
        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("<html"));
    }

    #[tokio::test]
    async fn test_registration_rejects_duplicates_and_mismatch() {
        let app = setup_test_app().await;
        let server = server(&app);
        register(&server, "dave", "dave@x.com").await;

        let response = server
            .post("/api/v1/auth/register/")
            .json(&json!({
                "username": "dave2",
                "email": "dave@x.com",
                "password": PASSWORD,
                "password_confirm": PASSWORD,
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "invalid");
        assert!(body.errors.unwrap().contains_key("email"));

        let response = server
            .post("/api/v1/auth/register/")
            .json(&json!({
                "username": "erin",
                "email": "erin@x.com",
                "password": PASSWORD,
                "password_confirm": "something-else",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(
            body.errors.unwrap()["password"],
            vec!["Passwords do not match.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_login_failures() {
        let app = setup_test_app().await;
        let server = server(&app);
        seed_user(&app.state, "frank", false).await;

        let response = server
            .post("/api/v1/auth/login/")
            .json(&login_request("frank", "wrong-password"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "no_active_account");

        let response = server
            .post("/api/v1/auth/login/")
            .json(&json!({ "password": PASSWORD }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "missing_credentials");

        // Malformed bodies use the error envelope
        let response = server
            .post("/api/v1/auth/login/")
            .add_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .text("{not json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert!(!body.success);
    }

    #[tokio::test]
    async fn test_anonymous_requests_are_rejected() {
        let app = setup_test_app().await;
        let server = server(&app);

        let response = server.get("/api/v1/projects/").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "not_authenticated");

        server
            .get("/api/v1/auth/profile/")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer garbage"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_project_crud_and_isolation() {
        let app = setup_test_app().await;
        let server = server(&app);
        let alice = seed_user(&app.state, "alice", false).await;
        let bob = seed_user(&app.state, "bob", false).await;
        let staff = seed_user(&app.state, "staff", true).await;
        let (alice_auth, alice_token) = bearer(&app.state, &alice);
        let (bob_auth, bob_token) = bearer(&app.state, &bob);

        let response = server
            .post("/api/v1/projects/")
            .add_header(alice_auth.clone(), alice_token.clone())
            .json(&json!({
                "title": "Compiler",
                "description": "A toy compiler",
                "github_link": "https://github.com/alice/compiler",
                "project_image": "projects/compiler.png",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ApiResponse<ProjectResponse> = response.json();
        assert_eq!(created.data.user, Some(alice.id));
        assert!(created
            .data
            .project_image
            .as_deref()
            .unwrap()
            .ends_with("/media/projects/compiler.png"));
        let path = format!("/api/v1/projects/{}/", created.data.id);

        // Bob neither sees nor touches Alice's project
        let response = server
            .get("/api/v1/projects/")
            .add_header(bob_auth.clone(), bob_token.clone())
            .await;
        let listed: ApiResponse<Vec<ProjectResponse>> = response.json();
        assert!(listed.data.is_empty());
        server
            .get(&path)
            .add_header(bob_auth.clone(), bob_token.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&path)
            .add_header(bob_auth, bob_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Staff see everything
        let (staff_auth, staff_token) = bearer(&app.state, &staff);
        let response = server
            .get("/api/v1/projects/")
            .add_header(staff_auth, staff_token)
            .await;
        let listed: ApiResponse<Vec<ProjectResponse>> = response.json();
        assert_eq!(listed.data.len(), 1);

        // PATCH changes only what it names; null clears a link
        let response = server
            .patch(&path)
            .add_header(alice_auth.clone(), alice_token.clone())
            .json(&json!({ "title": "Compiler v2", "github_link": null }))
            .await;
        response.assert_status(StatusCode::OK);
        let updated: ApiResponse<ProjectResponse> = response.json();
        assert_eq!(updated.data.title, "Compiler v2");
        assert_eq!(updated.data.description, "A toy compiler");
        assert_eq!(updated.data.github_link, None);

        server
            .put(&path)
            .add_header(alice_auth.clone(), alice_token.clone())
            .json(&json!({ "title": "", "description": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .delete(&path)
            .add_header(alice_auth.clone(), alice_token.clone())
            .await
            .assert_status(StatusCode::OK);
        server
            .get(&path)
            .add_header(alice_auth, alice_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_content_is_private_to_its_owner() {
        let app = setup_test_app().await;
        let server = server(&app);
        let alice = seed_user(&app.state, "alice", false).await;
        let bob = seed_user(&app.state, "bob", false).await;
        let (alice_auth, alice_token) = bearer(&app.state, &alice);
        let (bob_auth, bob_token) = bearer(&app.state, &bob);

        let routes = [
            (
                "/api/v1/about/",
                json!({ "name": "Alice", "title": "Engineer" }),
                json!({ "name": "Bob", "title": "Intruder" }),
            ),
            (
                "/api/v1/projects/",
                json!({ "title": "Compiler" }),
                json!({ "title": "Stolen" }),
            ),
            (
                "/api/v1/experience/",
                json!({ "role": "Engineer", "company": "Acme", "start_date": "2020-01-01" }),
                json!({ "role": "Intruder", "company": "Acme", "start_date": "2021-01-01" }),
            ),
            (
                "/api/v1/education/",
                json!({ "institution": "MIT", "degree": "BSc", "start_year": 2015 }),
                json!({ "institution": "MIT", "degree": "PhD", "start_year": 2019 }),
            ),
            (
                "/api/v1/skills/",
                json!({ "name": "Rust", "level": "Advanced" }),
                json!({ "name": "Rust", "level": "Beginner" }),
            ),
            (
                "/api/v1/social-media/",
                json!({ "url": "https://github.com/alice" }),
                json!({ "url": "https://github.com/bob" }),
            ),
        ];

        for (collection, create, replace) in routes {
            let response = server
                .post(collection)
                .add_header(alice_auth.clone(), alice_token.clone())
                .json(&create)
                .await;
            response.assert_status(StatusCode::CREATED);
            let created: ApiResponse<serde_json::Value> = response.json();
            let path = format!("{}{}/", collection, created.data["id"]);

            let listed: ApiResponse<Vec<serde_json::Value>> = server
                .get(collection)
                .add_header(bob_auth.clone(), bob_token.clone())
                .await
                .json();
            assert!(listed.data.is_empty(), "{} leaked to another user", collection);

            server
                .get(&path)
                .add_header(bob_auth.clone(), bob_token.clone())
                .await
                .assert_status(StatusCode::NOT_FOUND);
            server
                .put(&path)
                .add_header(bob_auth.clone(), bob_token.clone())
                .json(&replace)
                .await
                .assert_status(StatusCode::NOT_FOUND);
            server
                .patch(&path)
                .add_header(bob_auth.clone(), bob_token.clone())
                .json(&replace)
                .await
                .assert_status(StatusCode::NOT_FOUND);
            server
                .delete(&path)
                .add_header(bob_auth.clone(), bob_token.clone())
                .await
                .assert_status(StatusCode::NOT_FOUND);

            // Untouched for the owner
            let response = server
                .get(&path)
                .add_header(alice_auth.clone(), alice_token.clone())
                .await;
            response.assert_status(StatusCode::OK);
            let current: ApiResponse<serde_json::Value> = response.json();
            assert_eq!(current.data, created.data, "{} was modified", collection);
        }
    }

    #[tokio::test]
    async fn test_skill_level_must_be_a_known_choice() {
        let app = setup_test_app().await;
        let server = server(&app);
        let alice = seed_user(&app.state, "alice", false).await;
        let (name, value) = bearer(&app.state, &alice);

        server
            .post("/api/v1/skills/")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "name": "Rust", "level": "Advanced" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/v1/skills/")
            .add_header(name, value)
            .json(&json!({ "name": "Rust", "level": "wizard" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert!(!body.success);
    }

    #[tokio::test]
    async fn test_contact_info_visibility() {
        let app = setup_test_app().await;
        let server = server(&app);
        let staff = seed_user(&app.state, "staff", true).await;
        let alice = seed_user(&app.state, "alice", false).await;
        let (staff_auth, staff_token) = bearer(&app.state, &staff);

        let (alice_auth, alice_token) = bearer(&app.state, &alice);
        server
            .post("/api/v1/contact-info/")
            .add_header(alice_auth, alice_token)
            .json(&json!({ "email": "hello@portfy.test" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post("/api/v1/contact-info/")
            .add_header(staff_auth.clone(), staff_token.clone())
            .json(&json!({ "email": "old@portfy.test", "is_active": false }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let inactive: ApiResponse<serde_json::Value> = response.json();
        server
            .post("/api/v1/contact-info/")
            .add_header(staff_auth.clone(), staff_token.clone())
            .json(&json!({ "email": "hello@portfy.test", "phone": "+1 555 0100" }))
            .await
            .assert_status(StatusCode::CREATED);

        // Anonymous visitors only see active rows
        let response = server.get("/api/v1/contact-info/").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0]["email"], "hello@portfy.test");

        let inactive_path = format!("/api/v1/contact-info/{}/", inactive.data["id"]);
        server
            .get(&inactive_path)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Staff see both, active first
        let response = server
            .get("/api/v1/contact-info/")
            .add_header(staff_auth.clone(), staff_token.clone())
            .await;
        let body: ApiResponse<Vec<serde_json::Value>> = response.json();
        assert_eq!(body.data.len(), 2);
        assert_eq!(body.data[0]["is_active"], true);
        server
            .get(&inactive_path)
            .add_header(staff_auth, staff_token)
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_message_to_portfolio_requires_publication() {
        let app = setup_test_app().await;
        let server = server(&app);
        let alice = seed_user(&app.state, "alice", false).await;
        let message = MessageRequest {
            name: "Visitor".to_string(),
            email: "visitor@example.com".to_string(),
            message: "Loved your work".to_string(),
        };

        let response = server
            .post("/api/v1/auth/portfolio/alice/message/")
            .json(&message)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "permission_denied");

        server
            .post("/api/v1/auth/portfolio/nobody/message/")
            .json(&message)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let response = server.get("/api/v1/portfolio/alice/").await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["portfolio_published"], false);
        assert_eq!(body["username_slug"], "alice");

        let (name, value) = bearer(&app.state, &alice);
        server
            .patch("/api/v1/auth/profile/")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "portfolio_published": true }))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .post("/api/v1/auth/portfolio/alice/message/")
            .json(&message)
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<MessageResponse> = response.json();
        assert_eq!(body.data.status, MessageStatus::New);
        assert_eq!(body.data.user.as_ref().map(|owner| owner.id), Some(alice.id));

        // Blank fields are rejected once the portfolio accepts messages
        server
            .post("/api/v1/auth/portfolio/alice/message/")
            .json(&json!({ "name": " ", "email": "visitor@example.com", "message": "Hi" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .get("/api/v1/contact-messages/")
            .add_header(name, value)
            .await;
        let inbox: ApiResponse<Vec<MessageResponse>> = response.json();
        assert_eq!(inbox.data.len(), 1);
    }

    #[tokio::test]
    async fn test_published_portfolio_content() {
        let app = setup_test_app().await;
        let server = server(&app);
        let alice = seed_user(&app.state, "alice", false).await;
        let (name, value) = bearer(&app.state, &alice);

        server
            .patch("/api/v1/auth/profile/")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "portfolio_published": true }))
            .await
            .assert_status(StatusCode::OK);
        server
            .post("/api/v1/projects/")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "title": "Compiler" }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/v1/experience/")
            .add_header(name, value)
            .json(&json!({
                "role": "Engineer",
                "company": "Acme",
                "start_date": "2020-01-01",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get("/api/v1/portfolio/alice/").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["profile"]["username"], "alice");
        assert_eq!(body.data["projects"].as_array().unwrap().len(), 1);
        assert_eq!(body.data["experiences"][0]["company"], "Acme");
        assert!(body.data["about_me"].is_null());
    }

    #[tokio::test]
    async fn test_message_workflow() {
        let app = setup_test_app().await;
        let server = server(&app);
        let alice = seed_user(&app.state, "alice", false).await;
        let bob = seed_user(&app.state, "bob", false).await;
        let (name, value) = bearer(&app.state, &alice);
        server
            .patch("/api/v1/auth/profile/")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "portfolio_published": true }))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .post("/api/v1/auth/portfolio/alice/message/")
            .json(&json!({
                "name": "Visitor",
                "email": "visitor@example.com",
                "message": "Are you available?",
            }))
            .await;
        let created: ApiResponse<MessageResponse> = response.json();
        let base = format!("/api/v1/contact-messages/{}", created.data.id);

        // Other users cannot see it
        let (bob_auth, bob_token) = bearer(&app.state, &bob);
        server
            .post(&format!("{}/mark_read/", base))
            .add_header(bob_auth, bob_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let response = server
            .post(&format!("{}/mark_read/", base))
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status(StatusCode::OK);
        let read: ApiResponse<MessageResponse> = response.json();
        assert_eq!(read.data.status, MessageStatus::Read);

        server
            .post(&format!("{}/reply/", base))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "reply": "   " }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        app.mailer.clear();
        let response = server
            .post(&format!("{}/reply/", base))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "reply": "Yes, next month." }))
            .await;
        response.assert_status(StatusCode::OK);
        let replied: ApiResponse<ReplyResponse> = response.json();
        assert_eq!(replied.data.message.status, MessageStatus::Replied);
        assert_eq!(replied.data.email_status, "sent");
        assert!(replied.data.message.replied_at.is_some());
        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "visitor@example.com");

        let response = server
            .post(&format!("{}/archive/", base))
            .add_header(name.clone(), value.clone())
            .await;
        let archived: ApiResponse<MessageResponse> = response.json();
        assert_eq!(archived.data.status, MessageStatus::Archived);

        // Archived messages cannot be replied to
        server
            .post(&format!("{}/reply/", base))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "reply": "Again" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .delete(&format!("{}/", base))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reply_kept_when_email_fails() {
        let app = setup_test_app_with_mailer(MemoryMailer::failing()).await;
        let server = server(&app);
        let staff = seed_user(&app.state, "staff", true).await;
        let (name, value) = bearer(&app.state, &staff);

        let response = server
            .post("/api/v1/contact-messages/")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "name": "Visitor",
                "email": "visitor@example.com",
                "message": "Site feedback",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ApiResponse<MessageResponse> = response.json();
        assert!(created.data.user.is_none());

        let response = server
            .post(&format!("/api/v1/contact-messages/{}/reply/", created.data.id))
            .add_header(name, value)
            .json(&json!({ "reply": "Thanks!" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ReplyResponse> = response.json();
        assert_eq!(body.data.email_status, "failed");
        assert!(body.data.email_message.starts_with("Failed to send email"));
        assert_eq!(body.data.message.reply.as_deref(), Some("Thanks!"));
    }

    #[tokio::test]
    async fn test_user_list_pagination() {
        let app = setup_test_app().await;
        let server = server(&app);
        let staff = seed_user(&app.state, "staff", true).await;
        for i in 0..44 {
            user::ActiveModel {
                username: Set(format!("member{:02}", i)),
                email: Set(format!("member{:02}@example.com", i)),
                password_hash: Set("!".to_string()),
                first_name: Set(String::new()),
                last_name: Set(String::new()),
                is_staff: Set(false),
                is_superuser: Set(false),
                is_active: Set(true),
                date_joined: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&app.state.db)
            .await
            .unwrap();
        }
        let (name, value) = bearer(&app.state, &staff);

        let response = server
            .get("/api/v1/auth/users/")
            .add_query_param("page", 1)
            .add_query_param("page_size", 30)
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<UserListResponse> = response.json();
        assert_eq!(body.data.results.len(), 30);
        assert_eq!(body.data.total_users, 45);
        assert_eq!(body.data.total_pages, 2);
        assert!(body.data.has_next);
        assert!(!body.data.has_previous);

        let response = server
            .get("/api/v1/auth/users/")
            .add_query_param("page", 2)
            .add_header(name.clone(), value.clone())
            .await;
        let body: ApiResponse<UserListResponse> = response.json();
        assert_eq!(body.data.results.len(), 15);
        assert!(!body.data.has_next);

        let response = server
            .get("/api/v1/auth/users/")
            .add_query_param("page_size", 25)
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert!(body.error.starts_with("Invalid page_size"));
    }

    #[tokio::test]
    async fn test_staff_only_administration() {
        let app = setup_test_app().await;
        let server = server(&app);
        let staff = seed_user(&app.state, "staff", true).await;
        let alice = seed_user(&app.state, "alice", false).await;

        let (alice_auth, alice_token) = bearer(&app.state, &alice);
        server
            .get("/api/v1/auth/users/")
            .add_header(alice_auth.clone(), alice_token.clone())
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get("/api/v1/auth/system/overview/")
            .add_header(alice_auth, alice_token)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let (name, value) = bearer(&app.state, &staff);
        let response = server
            .patch(&format!("/api/v1/auth/users/{}/approval/", staff.id))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "is_approved": false }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        server
            .patch(&format!("/api/v1/auth/users/{}/status/", staff.id))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "is_active": false }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Publishing twice is harmless and only the first call emails the owner
        app.mailer.clear();
        let publish_path = format!("/api/v1/auth/users/{}/publish/", alice.id);
        for _ in 0..2 {
            let response = server
                .patch(&publish_path)
                .add_header(name.clone(), value.clone())
                .json(&json!({ "portfolio_published": true }))
                .await;
            response.assert_status(StatusCode::OK);
            let body: ApiResponse<serde_json::Value> = response.json();
            assert_eq!(body.data["portfolio_published"], true);

            let sent = app.mailer.sent();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].to, "alice@example.com");
            assert_eq!(sent[0].subject, "Your Portfolio is Now Live! - Portfy");
        }

        app.mailer.clear();
        server
            .patch(&publish_path)
            .add_header(name.clone(), value.clone())
            .json(&json!({ "portfolio_published": false }))
            .await
            .assert_status(StatusCode::OK);
        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Your Portfolio Has Been Unpublished - Portfy");
        assert!(sent[0].text.contains("An administrator has unpublished your portfolio"));

        app.mailer.clear();
        server
            .patch(&format!("/api/v1/auth/users/{}/approval/", alice.id))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "is_approved": true }))
            .await
            .assert_status(StatusCode::OK);
        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert_eq!(sent[0].subject, "Your Portfy Account Has Been Approved!");

        let response = server
            .get("/api/v1/auth/system/overview/")
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["total_users"], 2);
    }

    #[tokio::test]
    async fn test_owner_publication_emails() {
        let app = setup_test_app().await;
        let server = server(&app);
        let alice = seed_user(&app.state, "alice", false).await;
        let (name, value) = bearer(&app.state, &alice);
        app.mailer.clear();

        for _ in 0..2 {
            server
                .patch("/api/v1/auth/profile/")
                .add_header(name.clone(), value.clone())
                .json(&json!({ "portfolio_published": true }))
                .await
                .assert_status(StatusCode::OK);
        }
        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Your Portfolio is Now Live! - Portfy");

        app.mailer.clear();
        server
            .patch("/api/v1/auth/profile/")
            .add_header(name, value)
            .json(&json!({ "portfolio_published": false }))
            .await
            .assert_status(StatusCode::OK);
        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("Your portfolio has been unpublished"));
        assert!(!sent[0].text.contains("An administrator"));
    }

    #[tokio::test]
    async fn test_deactivated_user_loses_access() {
        let app = setup_test_app().await;
        let server = server(&app);
        let staff = seed_user(&app.state, "staff", true).await;
        let alice = seed_user(&app.state, "alice", false).await;
        let (alice_auth, alice_token) = bearer(&app.state, &alice);

        let (name, value) = bearer(&app.state, &staff);
        server
            .patch(&format!("/api/v1/auth/users/{}/status/", alice.id))
            .add_header(name, value)
            .json(&json!({ "is_active": false }))
            .await
            .assert_status(StatusCode::OK);

        server
            .get("/api/v1/auth/profile/")
            .add_header(alice_auth, alice_token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/v1/auth/login/")
            .json(&login_request("alice", PASSWORD))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
