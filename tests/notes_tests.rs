// tests/notes_tests.rs

mod common;

use common::{TestApp, client, flash_messages, location, spawn_app};
use reqwest::multipart::{Form, Part};

async fn upload(
    app: &TestApp,
    client: &reqwest::Client,
    title: &str,
    filename: &str,
    body: &'static [u8],
) -> reqwest::Response {
    let form = Form::new()
        .text("title", title.to_string())
        .part("file", Part::bytes(body).file_name(filename.to_string()));

    client
        .post(app.url("/upload_notes"))
        .multipart(form)
        .send()
        .await
        .expect("Upload failed")
}

#[tokio::test]
async fn upload_list_download_delete() {
    // Arrange
    let app = spawn_app().await;
    let admin = app.admin_client().await;

    // Act
    let response = upload(&app, &admin, "Week 1", "my notes.txt", b"hello notes").await;

    // Assert
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(location(&response), "/view_notes");
    assert!(app.upload_dir.join("my_notes.txt").is_file());

    let listing = app.page(&admin, "/view_notes").await;
    assert!(
        flash_messages(&listing).contains(&"Notes uploaded successfully.".to_string())
    );
    let notes = listing["data"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["title"], "Week 1");
    assert_eq!(notes[0]["filename"], "my_notes.txt");
    assert_eq!(notes[0]["uploader"], "Admin");
    let note_id = notes[0]["id"].as_i64().unwrap();

    // Any logged-in user can download
    let user = app.user_client("A", "a@x.com", "pw1").await;
    let response = user
        .get(app.url("/download/my_notes.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"my_notes.txt\""
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"hello notes");

    // Delete removes both the record and the file
    let response = admin
        .post(app.url(&format!("/delete_note/{note_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/view_notes");
    assert_eq!(app.scalar("SELECT COUNT(*) FROM notes").await, 0);
    assert!(!app.upload_dir.join("my_notes.txt").exists());

    let response = user
        .get(app.url("/download/my_notes.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn download_outside_upload_dir_is_404() {
    let app = spawn_app().await;
    let admin = app.admin_client().await;
    upload(&app, &admin, "Notes", "notes.txt", b"data").await;

    // A file that exists next to the upload directory
    std::fs::write(app.upload_dir.join("..").join("secret.txt"), b"secret").unwrap();

    for path in [
        "/download/..%2Fsecret.txt",
        "/download/..%5Csecret.txt",
        "/download/%2Fetc%2Fpasswd",
        "/download/not%20sanitized.txt",
        "/download/missing.txt",
    ] {
        let response = admin.get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 404, "{path}");
    }
}

#[tokio::test]
async fn upload_requires_title_and_file() {
    let app = spawn_app().await;
    let admin = app.admin_client().await;

    let response = upload(&app, &admin, "   ", "notes.txt", b"data").await;
    assert_eq!(location(&response), "/upload_notes");

    let form = Form::new().text("title", "No file");
    let response = admin
        .post(app.url("/upload_notes"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/upload_notes");

    let page = app.page(&admin, "/upload_notes").await;
    assert!(
        flash_messages(&page)
            .contains(&"Please provide a title and choose a file.".to_string())
    );

    let response = upload(&app, &admin, "Bad name", "???", b"data").await;
    assert_eq!(location(&response), "/upload_notes");

    assert_eq!(app.scalar("SELECT COUNT(*) FROM notes").await, 0);
}

#[tokio::test]
async fn non_admin_cannot_upload_or_delete() {
    let app = spawn_app().await;
    let admin = app.admin_client().await;
    upload(&app, &admin, "Notes", "notes.txt", b"data").await;
    let note_id = app.scalar("SELECT id FROM notes").await;

    let user = app.user_client("A", "a@x.com", "pw1").await;
    let response = upload(&app, &user, "Sneaky", "sneaky.txt", b"x").await;
    assert_eq!(location(&response), "/");
    assert!(!app.upload_dir.join("sneaky.txt").exists());

    let response = user
        .post(app.url(&format!("/delete_note/{note_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/");
    assert_eq!(app.scalar("SELECT COUNT(*) FROM notes").await, 1);

    // Anonymous users cannot even list
    let response = client().get(app.url("/view_notes")).send().await.unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn deleting_note_with_missing_file_still_succeeds() {
    let app = spawn_app().await;
    let admin = app.admin_client().await;
    upload(&app, &admin, "Gone", "gone.txt", b"data").await;
    let note_id = app.scalar("SELECT id FROM notes").await;

    std::fs::remove_file(app.upload_dir.join("gone.txt")).unwrap();

    let response = admin
        .post(app.url(&format!("/delete_note/{note_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/view_notes");
    assert_eq!(app.scalar("SELECT COUNT(*) FROM notes").await, 0);

    let response = admin
        .post(app.url(&format!("/delete_note/{note_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn deleting_one_of_two_notes_sharing_a_file_keeps_the_file() {
    let app = spawn_app().await;
    let admin = app.admin_client().await;
    upload(&app, &admin, "Old", "notes.txt", b"first").await;
    upload(&app, &admin, "New", "notes.txt", b"second").await;
    let old_id = app
        .scalar("SELECT id FROM notes WHERE title = 'Old'")
        .await;

    let response = admin
        .post(app.url(&format!("/delete_note/{old_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/view_notes");
    assert_eq!(app.scalar("SELECT COUNT(*) FROM notes").await, 1);

    let response = admin
        .get(app.url("/download/notes.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"second");

    // The last reference takes the file with it
    let new_id = app.scalar("SELECT id FROM notes").await;
    admin
        .post(app.url(&format!("/delete_note/{new_id}")))
        .send()
        .await
        .unwrap();
    assert!(!app.upload_dir.join("notes.txt").exists());
}

#[tokio::test]
async fn note_title_is_stored_as_plain_text() {
    let app = spawn_app().await;
    let admin = app.admin_client().await;

    upload(&app, &admin, "Q&A <b>intro</b>", "qa.txt", b"data").await;

    let listing = app.page(&admin, "/view_notes").await;
    assert_eq!(listing["data"][0]["title"], "Q&A intro");
}
