mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{ids, TestApp, TestFile, BASE_URL};
use serde_json::{json, Value};

fn photo_filenames(trip: &Value) -> Vec<String> {
    trip["photos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|photo| photo["filename"].as_str().unwrap().to_string())
        .collect()
}

async fn fetch_upload(app: &TestApp, filename: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/uploads/{filename}"))
        .body(Body::empty())
        .unwrap();
    app.send(request).await
}

#[tokio::test]
async fn creates_a_trip_with_photos() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.signup("alice").await;
    let user_id = alice.to_string();

    let (status, trip) = app
        .post_multipart(
            "/trips",
            &[
                ("userId", &user_id),
                ("city", "Paris"),
                ("country", "France"),
                ("startDate", "2024-05-01"),
                ("endDate", "2024-05-07"),
                ("favoriteRestaurants", "Le Comptoir"),
            ],
            &[
                TestFile {
                    field: "media",
                    filename: "eiffel.jpg",
                    mimetype: "image/jpeg",
                    bytes: b"jpeg bytes",
                },
                TestFile {
                    field: "media",
                    filename: "../louvre.png",
                    mimetype: "image/png",
                    bytes: b"png bytes",
                },
            ],
            None,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{trip}");
    assert_eq!(trip["user_id"], alice);
    assert_eq!(trip["user"]["username"], "alice");
    assert_eq!(trip["city"], "Paris");
    assert_eq!(trip["start_date"], "2024-05-01");
    assert_eq!(trip["favorite_restaurants"], "Le Comptoir");
    assert_eq!(trip["like_count"], 0);
    assert_eq!(trip["comments"], json!([]));

    let photos = trip["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 2);
    assert_eq!(photos[0]["mimetype"], "image/jpeg");
    assert!(photos[1]["filename"].as_str().unwrap().ends_with("_louvre.png"));

    for photo in photos {
        let filename = photo["filename"].as_str().unwrap();
        assert_eq!(
            photo["url"],
            format!("{BASE_URL}/uploads/{filename}").as_str()
        );
        assert!(app.upload_path(filename).exists());
    }

    let (status, bytes) = fetch_upload(&app, photos[0]["filename"].as_str().unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"jpeg bytes");

    let (status, fetched) = app.get(&format!("/trip/{}", trip["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["photos"], trip["photos"]);
}

#[tokio::test]
async fn rejects_incomplete_trips() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.signup("alice").await;
    let user_id = alice.to_string();

    let (status, body) = app
        .post_multipart(
            "/trips",
            &[("user_id", &user_id), ("city", "Paris"), ("country", "France")],
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "start_date is required");

    let (status, _) = app
        .post_multipart(
            "/trips",
            &[
                ("user_id", "999"),
                ("city", "Paris"),
                ("country", "France"),
                ("start_date", "2024-05-01"),
                ("end_date", "2024-05-07"),
            ],
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, cities) = app.get("/cities").await;
    assert_eq!(cities, json!([]));
}

#[tokio::test]
async fn failed_insert_removes_stored_photos() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.signup("alice").await;
    let user_id = alice.to_string();

    sqlx::query(
        "CREATE TRIGGER reject_trips BEFORE INSERT ON trips
         BEGIN SELECT RAISE(ABORT, 'trips are read-only'); END",
    )
    .execute(&app.state.pool)
    .await
    .unwrap();

    let (status, body) = app
        .post_multipart(
            "/trips",
            &[
                ("user_id", &user_id),
                ("city", "Paris"),
                ("country", "France"),
                ("start_date", "2024-05-01"),
                ("end_date", "2024-05-07"),
            ],
            &[TestFile {
                field: "media",
                filename: "eiffel.jpg",
                mimetype: "image/jpeg",
                bytes: b"jpeg bytes",
            }],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");

    let leftovers = std::fs::read_dir(app.upload_dir.path()).unwrap().count();
    assert_eq!(leftovers, 0);

    let (_, cities) = app.get("/cities").await;
    assert_eq!(cities, json!([]));
}

#[tokio::test]
async fn lists_a_users_trips_newest_first() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.signup("alice").await;

    let first = app.create_trip(alice, "Paris", "France").await;
    let second = app.create_trip(alice, "Rome", "Italy").await;

    let (status, trips) = app.get(&format!("/trips/{alice}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&trips),
        vec![second["id"].as_i64().unwrap(), first["id"].as_i64().unwrap()]
    );

    let (status, _) = app.get("/trips/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/trip/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feed_contains_only_followed_users_trips() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.signup("alice").await;
    let (bob, _) = app.signup("bob").await;
    let (carol, _) = app.signup("carol").await;
    let (dave, _) = app.signup("dave").await;

    app.follow(alice, bob).await;
    app.follow(alice, carol).await;

    let bob_trip = app.create_trip(bob, "Paris", "France").await;
    let dave_trip = app.create_trip(dave, "Oslo", "Norway").await;
    let carol_trip = app.create_trip(carol, "Rome", "Italy").await;
    app.create_trip(alice, "Lisbon", "Portugal").await;

    let (status, feed) = app.get(&format!("/feed/{alice}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&feed),
        vec![
            carol_trip["id"].as_i64().unwrap(),
            bob_trip["id"].as_i64().unwrap()
        ]
    );
    assert!(!ids(&feed).contains(&dave_trip["id"].as_i64().unwrap()));

    let (_, feed) = app.get(&format!("/feed/{dave}")).await;
    assert_eq!(feed, json!([]));

    let (status, _) = app.get("/feed/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_trip_removes_its_files() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.signup("alice").await;
    let (bob, _) = app.signup("bob").await;
    let user_id = alice.to_string();

    let (_, trip) = app
        .post_multipart(
            "/trips",
            &[
                ("user_id", &user_id),
                ("city", "Paris"),
                ("country", "France"),
                ("start_date", "2024-05-01"),
                ("end_date", "2024-05-07"),
            ],
            &[TestFile {
                field: "media",
                filename: "eiffel.jpg",
                mimetype: "image/jpeg",
                bytes: b"jpeg bytes",
            }],
            None,
        )
        .await;
    let trip_id = trip["id"].as_i64().unwrap();
    let filename = photo_filenames(&trip).remove(0);

    app.post(&format!("/trips/{trip_id}/like"), json!({ "user_id": bob }))
        .await;
    app.post(
        &format!("/trips/{trip_id}/comments"),
        json!({ "user_id": bob, "content": "Lovely" }),
    )
    .await;

    let (status, body) = app.delete(&format!("/trips/{trip_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Trip deleted");

    assert!(!app.upload_path(&filename).exists());
    let (status, _) = fetch_upload(&app, &filename).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get(&format!("/trip/{trip_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get(&format!("/trips/{trip_id}/likes")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/trips/{trip_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_owner_may_delete_with_a_token() {
    let app = TestApp::spawn().await;
    let (alice, alice_token) = app.signup("alice").await;
    let (_, bob_token) = app.signup("bob").await;

    let trip = app.create_trip(alice, "Paris", "France").await;
    let uri = format!("/trips/{}", trip["id"]);

    let (status, _) = app
        .request(Method::DELETE, &uri, None, Some(&bob_token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::DELETE, &uri, None, Some(&alice_token))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn avatar_upload_replaces_the_previous_file() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.signup("alice").await;
    let uri = format!("/users/{alice}/upload_photo");

    let (status, body) = app
        .post_multipart(
            &uri,
            &[],
            &[TestFile {
                field: "photo",
                filename: "me.png",
                mimetype: "image/png",
                bytes: b"first",
            }],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let first_url = body["url"].as_str().unwrap().to_string();
    assert!(first_url.starts_with(&format!("{BASE_URL}/uploads/")));
    let first_file = first_url.rsplit('/').next().unwrap().to_string();
    assert!(app.upload_path(&first_file).exists());

    let (_, user) = app.get(&format!("/users/{alice}")).await;
    assert_eq!(user["avatar_url"], first_url.as_str());

    let (status, body) = app
        .post_multipart(
            &uri,
            &[],
            &[TestFile {
                field: "photo",
                filename: "me-again.png",
                mimetype: "image/png",
                bytes: b"second",
            }],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let second_file = body["url"].as_str().unwrap().rsplit('/').next().unwrap();

    assert!(!app.upload_path(&first_file).exists());
    assert!(app.upload_path(second_file).exists());

    let (status, _) = app.post_multipart(&uri, &[], &[], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_multipart("/users/999/upload_photo", &[], &[], None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sweep_removes_only_unreferenced_uploads() {
    let app = TestApp::spawn().await;
    let (alice, _) = app.signup("alice").await;
    let user_id = alice.to_string();

    let (_, trip) = app
        .post_multipart(
            "/trips",
            &[
                ("user_id", &user_id),
                ("city", "Paris"),
                ("country", "France"),
                ("start_date", "2024-05-01"),
                ("end_date", "2024-05-07"),
            ],
            &[TestFile {
                field: "media",
                filename: "kept.jpg",
                mimetype: "image/jpeg",
                bytes: b"kept",
            }],
            None,
        )
        .await;
    let kept = photo_filenames(&trip).remove(0);

    std::fs::write(app.upload_path("stray.jpg"), b"stray").unwrap();

    let removed = app.state.sweep_uploads().await.unwrap();
    assert_eq!(removed, 1);
    assert!(app.upload_path(&kept).exists());
    assert!(!app.upload_path("stray.jpg").exists());
}
