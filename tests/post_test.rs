mod common;

use serde_json::Value;

#[tokio::test]
async fn anonymous_create_redirects_to_login() {
    let app = common::spawn_app().await;

    let resp = app.get("/create/", None).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(common::location(&resp), "/auth/login/?next=%2Fcreate%2F");

    let resp = app.post_form("/create/", None, &[("text", "x")]).await;
    assert_eq!(resp.status(), 302);
    assert!(common::location(&resp).starts_with("/auth/login/?next="));
}

#[tokio::test]
async fn create_post_redirects_to_profile() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "author").await;
    let admin = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin.id).await;
    let slug = common::unique("grp").replace('_', "-");
    let group = common::create_test_group(&app, &admin, &slug).await;
    let group_id = group["id"].as_i64().unwrap().to_string();

    let resp = app
        .post_form(
            "/create/",
            Some(&author),
            &[("text", "Тестовый пост"), ("group", group_id.as_str())],
        )
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        common::location(&resp),
        format!("/profile/{}/", author.username)
    );

    // Shows up on the group page and the profile
    let resp = app.get(&format!("/group/{}/", slug), None).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["page_obj"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["text"], "Тестовый пост");
    assert_eq!(items[0]["group"]["slug"], slug.as_str());

    let resp = app
        .get(&format!("/profile/{}/", author.username), None)
        .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["post_count"], 1);
    assert_eq!(body["data"]["following"], false);
}

#[tokio::test]
async fn invalid_form_stores_nothing() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "blank").await;

    let resp = app
        .post_form("/create/", Some(&author), &[("text", "   "), ("group", "")])
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["data"]["errors"]["text"].is_array());
    assert_eq!(body["data"]["is_edit"], false);

    let resp = app
        .post_form("/create/", Some(&author), &[("text", "ok"), ("group", "999999")])
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["errors"]["group"].is_array());

    let posts = common::count(
        &app.db,
        "SELECT COUNT(*) FROM posts WHERE author_id = $1",
        vec![author.id.into()],
    )
    .await;
    assert_eq!(posts, 0);
}

#[tokio::test]
async fn create_post_with_image() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "imager").await;

    let small_gif: Vec<u8> = vec![
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];
    let part = reqwest::multipart::Part::bytes(small_gif)
        .file_name("small.gif")
        .mime_str("image/gif")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("text", "Пост с картинкой")
        .text("group", "")
        .part("image", part);

    let resp = app
        .client
        .post(app.url("/create/"))
        .bearer_auth(&author.token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);

    let resp = app
        .get(&format!("/profile/{}/", author.username), None)
        .await;
    let body: Value = resp.json().await.unwrap();
    let image = body["data"]["page_obj"]["items"][0]["image"].as_str().unwrap();
    assert!(image.starts_with("/media/posts/"));
}

#[tokio::test]
async fn non_image_upload_is_a_field_error() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "notimg").await;

    let part = reqwest::multipart::Part::bytes(b"plain text".to_vec())
        .file_name("notes.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("text", "Текст")
        .part("image", part);

    let resp = app
        .client
        .post(app.url("/create/"))
        .bearer_auth(&author.token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["errors"]["image"].is_array());
}

#[tokio::test]
async fn author_edits_post() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "editor").await;
    let post_id = common::create_test_post(&app, &author, "Старый текст").await;
    let path = format!("/posts/{}/edit/", post_id);

    let resp = app.get(&path, Some(&author)).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["is_edit"], true);
    assert_eq!(body["data"]["form"]["text"], "Старый текст");

    let resp = app
        .post_form(&path, Some(&author), &[("text", "Новый текст"), ("group", "")])
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(common::location(&resp), format!("/posts/{}/", post_id));

    let resp = app.get(&format!("/posts/{}/", post_id), None).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["post"]["text"], "Новый текст");
}

#[tokio::test]
async fn non_author_cannot_edit() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "owner").await;
    let intruder = common::create_test_user(&app, "intruder").await;
    let post_id = common::create_test_post(&app, &author, "Оригинал").await;
    let path = format!("/posts/{}/edit/", post_id);
    let detail = format!("/posts/{}/", post_id);

    let resp = app.get(&path, Some(&intruder)).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(common::location(&resp), detail);

    let resp = app
        .post_form(&path, Some(&intruder), &[("text", "Взлом")])
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(common::location(&resp), detail);

    let resp = app.get(&detail, None).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["post"]["text"], "Оригинал");
}

#[tokio::test]
async fn comments_listed_newest_first() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "poster").await;
    let reader = common::create_test_user(&app, "reader").await;
    let post_id = common::create_test_post(&app, &author, "Обсуждение").await;
    let path = format!("/posts/{}/comment/", post_id);

    for text in ["первый", "второй"] {
        let resp = app.post_form(&path, Some(&reader), &[("text", text)]).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(common::location(&resp), format!("/posts/{}/", post_id));
    }

    // Blank comment still redirects but stores nothing
    let resp = app.post_form(&path, Some(&reader), &[("text", "  ")]).await;
    assert_eq!(resp.status(), 302);

    let resp = app.get(&format!("/posts/{}/", post_id), None).await;
    let body: Value = resp.json().await.unwrap();
    let comments = body["data"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["text"], "второй");
    assert_eq!(comments[0]["author"], reader.username.as_str());
    assert_eq!(body["data"]["form"]["text"], "");
}

#[tokio::test]
async fn anonymous_comment_redirects_to_login() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "quiet").await;
    let post_id = common::create_test_post(&app, &author, "Тишина").await;

    let resp = app
        .post_form(&format!("/posts/{}/comment/", post_id), None, &[("text", "hi")])
        .await;
    assert_eq!(resp.status(), 302);
    assert!(common::location(&resp).starts_with("/auth/login/?next="));
}

#[tokio::test]
async fn delete_post_removes_comments_only() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "deleter").await;
    let admin = common::create_test_user(&app, "gadmin").await;
    common::make_admin(&app.db, admin.id).await;
    let slug = common::unique("keep").replace('_', "-");
    let group = common::create_test_group(&app, &admin, &slug).await;
    let group_id = group["id"].as_i64().unwrap().to_string();

    let resp = app
        .post_form(
            "/create/",
            Some(&author),
            &[("text", "Удаляемый"), ("group", group_id.as_str())],
        )
        .await;
    assert_eq!(resp.status(), 302);
    let post_id = common::count(
        &app.db,
        "SELECT MAX(id)::bigint FROM posts WHERE author_id = $1",
        vec![author.id.into()],
    )
    .await;

    app.post_form(
        &format!("/posts/{}/comment/", post_id),
        Some(&author),
        &[("text", "комментарий")],
    )
    .await;

    // Someone else cannot delete it
    let stranger = common::create_test_user(&app, "stranger").await;
    let resp = app
        .post_form(&format!("/posts/{}/delete/", post_id), Some(&stranger), &[])
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(common::location(&resp), format!("/posts/{}/", post_id));

    let resp = app
        .post_form(&format!("/posts/{}/delete/", post_id), Some(&author), &[])
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        common::location(&resp),
        format!("/profile/{}/", author.username)
    );

    let comments = common::count(
        &app.db,
        "SELECT COUNT(*) FROM comments WHERE post_id = $1",
        vec![(post_id as i32).into()],
    )
    .await;
    assert_eq!(comments, 0);

    let resp = app.get(&format!("/posts/{}/", post_id), None).await;
    assert_eq!(resp.status(), 404);
    let resp = app.get(&format!("/group/{}/", slug), None).await;
    assert_eq!(resp.status(), 200);
    let resp = app
        .get(&format!("/profile/{}/", author.username), None)
        .await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn unknown_pages_are_404() {
    let app = common::spawn_app().await;

    assert_eq!(app.get("/unexisting_page/", None).await.status(), 404);
    assert_eq!(app.get("/posts/2147483647/", None).await.status(), 404);
    assert_eq!(app.get("/group/no-such-group/", None).await.status(), 404);
    let missing = common::unique("ghost");
    assert_eq!(
        app.get(&format!("/profile/{}/", missing), None).await.status(),
        404
    );
}

#[tokio::test]
async fn index_page_is_cached() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "cached").await;
    let text = common::unique("cached post");
    let post_id = common::create_test_post(&app, &author, &text).await;

    let contains = |body: &Value| {
        body["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p["text"] == text.as_str())
    };

    let first: Value = app.get("/", None).await.json().await.unwrap();
    assert!(contains(&first));

    let resp = app
        .post_form(&format!("/posts/{}/delete/", post_id), Some(&author), &[])
        .await;
    assert_eq!(resp.status(), 302);

    // Still served from cache after the delete
    let second: Value = app.get("/", None).await.json().await.unwrap();
    assert!(contains(&second));
}

#[tokio::test]
async fn out_of_range_page_clamps_to_last() {
    let app = common::spawn_app_with(yatube::config::site::SiteConfig {
        posts_per_page: 1,
        index_cache_ttl: 0,
        ..Default::default()
    })
    .await;
    let author = common::create_test_user(&app, "pager").await;
    common::create_test_post(&app, &author, "один").await;
    common::create_test_post(&app, &author, "два").await;

    let path = format!("/profile/{}/", author.username);
    let body: Value = app
        .get(&format!("{}?page=99", path), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["page_obj"]["page"], 2);
    assert_eq!(body["data"]["page_obj"]["total_pages"], 2);
    assert_eq!(body["data"]["page_obj"]["items"][0]["text"], "один");

    let body: Value = app
        .get(&format!("{}?page=abc", path), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["page_obj"]["page"], 1);
    assert_eq!(body["data"]["page_obj"]["items"][0]["text"], "два");
}
