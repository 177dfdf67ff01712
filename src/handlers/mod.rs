pub mod about;
pub mod auth;
pub mod follow;
pub mod group;
pub mod health;
pub mod post;

use url::form_urlencoded::byte_serialize;

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", byte_serialize(username.as_bytes()).collect::<String>())
}

pub fn post_detail_url(post_id: i32) -> String {
    format!("/posts/{}/", post_id)
}
