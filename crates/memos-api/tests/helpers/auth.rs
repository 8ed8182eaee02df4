use memos_api::auth::generate_access_token;

pub const TEST_JWT_SECRET: &str = "memos-test-secret-at-least-16-chars";

/// `Authorization` header value for `user_id`.
pub fn bearer(user_id: i32) -> String {
    let token = generate_access_token("tester", user_id, TEST_JWT_SECRET)
        .expect("Failed to sign test token");
    format!("Bearer {}", token)
}
