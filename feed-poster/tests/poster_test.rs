use chrono::{Duration, Utc};
use feed_poster::{Database, FeedPoster, FeedSelection, FeedUpdate, FetchConfig, RunOptions};
use mockito::{Matcher, Mock, Server};

const ACCOUNT: &str = r#"{"id":"7","username":"bot","acct":"bot"}"#;
const STATUS: &str = r#"{"id":"1","url":null}"#;

fn rss_feed() -> String {
    let newer = (Utc::now() - Duration::hours(1)).to_rfc2822();
    let older = (Utc::now() - Duration::hours(5)).to_rfc2822();
    let ancient = (Utc::now() - Duration::days(90)).to_rfc2822();

    format!(
        r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Example blog</title>
  <item>
    <guid>post-2</guid>
    <title>Second post</title>
    <link>https://blog.example.com/2</link>
    <pubDate>{newer}</pubDate>
    <category>Rust Lang</category>
  </item>
  <item>
    <guid>post-1</guid>
    <title>First post</title>
    <link>https://blog.example.com/1</link>
    <pubDate>{older}</pubDate>
  </item>
  <item>
    <guid>post-0</guid>
    <title>Archive</title>
    <link>https://blog.example.com/0</link>
    <pubDate>{ancient}</pubDate>
  </item>
</channel></rss>"#
    )
}

async fn mock_feed(server: &mut Server, path: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(rss_feed())
        .create_async()
        .await
}

async fn mock_account(server: &mut Server) -> Mock {
    server
        .mock("GET", "/api/v1/accounts/verify_credentials")
        .match_header("authorization", "Bearer token-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ACCOUNT)
        .create_async()
        .await
}

async fn mock_status(server: &mut Server, status: &str) -> Mock {
    server
        .mock("POST", "/api/v1/statuses")
        .match_body(Matcher::UrlEncoded("status".to_string(), status.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(STATUS)
        .create_async()
        .await
}

async fn poster_with_feed(server: &Server, path: &str) -> (FeedPoster, i64) {
    let db = Database::in_memory().await.unwrap();
    let poster = FeedPoster::new(&db, FetchConfig::default()).unwrap();

    let feed_id = poster
        .feed_manager()
        .save_feed(FeedUpdate {
            feed_url: Some(format!("{}{}", server.url(), path)),
            instance_url: Some(server.url()),
            access_token: Some("token-1".to_string()),
            ..FeedUpdate::default()
        })
        .await
        .unwrap();

    (poster, feed_id)
}

#[tokio::test]
async fn each_entry_is_posted_once_oldest_first() {
    let mut server = Server::new_async().await;
    mock_feed(&mut server, "/feed.xml").await;
    let account = mock_account(&mut server).await.expect(2);
    let first = mock_status(&mut server, "First post\n\nhttps://blog.example.com/1")
        .await
        .expect(1);
    let second = mock_status(
        &mut server,
        "Second post\n\nhttps://blog.example.com/2\n #Rust_Lang",
    )
    .await
    .expect(1);

    let (poster, feed_id) = poster_with_feed(&server, "/feed.xml").await;

    let reports = poster
        .run_once(&FeedSelection::Catalog, RunOptions::default())
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].feed_id, feed_id);
    assert_eq!(reports[0].fetched, 3);
    assert_eq!(reports[0].published, 2);
    assert_eq!(reports[0].too_old, 1);

    let reports = poster
        .run_once(&FeedSelection::Catalog, RunOptions::default())
        .await
        .unwrap();
    assert_eq!(reports[0].published, 0);
    assert_eq!(reports[0].already_posted, 2);

    assert_eq!(poster.store().posted_count().await.unwrap(), 2);
    first.assert_async().await;
    second.assert_async().await;
    account.assert_async().await;
}

#[tokio::test]
async fn dry_run_records_without_posting() {
    let mut server = Server::new_async().await;
    mock_feed(&mut server, "/feed.xml").await;
    mock_account(&mut server).await;
    let statuses = server
        .mock("POST", "/api/v1/statuses")
        .expect(0)
        .create_async()
        .await;

    let (poster, _) = poster_with_feed(&server, "/feed.xml").await;
    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };

    let reports = poster.run_once(&FeedSelection::Catalog, options).await.unwrap();

    assert_eq!(reports[0].published, 2);
    assert!(poster.store().has_posted("post-1").await.unwrap());
    assert!(poster.store().has_posted("post-2").await.unwrap());
    assert!(!poster.store().has_posted("post-0").await.unwrap());
    statuses.assert_async().await;
}

#[tokio::test]
async fn broken_feed_does_not_stop_the_others() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/gone.xml")
        .with_status(404)
        .create_async()
        .await;
    mock_feed(&mut server, "/feed.xml").await;
    mock_account(&mut server).await;
    server
        .mock("POST", "/api/v1/statuses")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(STATUS)
        .expect(1)
        .create_async()
        .await;

    let (poster, broken_id) = poster_with_feed(&server, "/gone.xml").await;
    let working_id = poster
        .feed_manager()
        .save_feed(FeedUpdate {
            feed_url: Some(format!("{}/feed.xml", server.url())),
            instance_url: Some(server.url()),
            access_token: Some("token-1".to_string()),
            ..FeedUpdate::default()
        })
        .await
        .unwrap();

    let options = RunOptions {
        max_posts: 1,
        ..RunOptions::default()
    };
    let reports = poster.run_once(&FeedSelection::Catalog, options).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_ne!(reports[0].feed_id, broken_id);
    assert_eq!(reports[0].feed_id, working_id);
    assert_eq!(reports[0].published, 1);
    assert_eq!(reports[0].deferred, 1);
    assert!(poster.store().has_posted("post-1").await.unwrap());
}

#[tokio::test]
async fn single_feed_runs_without_the_catalog() {
    let mut server = Server::new_async().await;
    mock_feed(&mut server, "/feed.xml").await;
    mock_account(&mut server).await;
    server
        .mock("POST", "/api/v1/statuses")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(STATUS)
        .expect(2)
        .create_async()
        .await;

    let db = Database::in_memory().await.unwrap();
    let poster = FeedPoster::new(&db, FetchConfig::default()).unwrap();
    let feed = feed_poster::config::feed_from_lookup(|name| match name {
        "FEED_URL" => Some(format!("{}/feed.xml", server.url())),
        "INSTANCE_URL" => Some(server.url()),
        "ACCESS_TOKEN" => Some("token-1".to_string()),
        _ => None,
    })
    .unwrap();

    let reports = poster
        .run_once(&FeedSelection::Single(feed), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(reports[0].feed_id, 0);
    assert_eq!(reports[0].published, 2);
    assert!(poster.feed_manager().list_feeds().await.unwrap().is_empty());
}
