use super::*;
use crate::net::types::Category;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

// =========================================================================
// One-shot HTTP responder
// =========================================================================

/// Serve exactly one canned response and hand back the raw request head.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        tx.send(String::from_utf8_lossy(&buf).to_string()).unwrap();
    });

    (format!("http://{addr}/api"), rx)
}

const COMMUNITY_JSON: &str = r#"{"_id":"c 1","name":"Dog Lovers","description":"woof","category":"Dogs","memberCount":1,"members":[{"user":"u1","role":"admin"}],"createdBy":"u1"}"#;

// =========================================================================
// URLs
// =========================================================================

#[test]
fn endpoint_url_appends_encoded_segments() {
    let base = parse_base_url("http://host.test/api").unwrap();
    let url = endpoint_url(&base, &["communities", "a b/c", "join"]).unwrap();
    assert_eq!(url.as_str(), "http://host.test/api/communities/a%20b%2Fc/join");
}

#[test]
fn endpoint_url_tolerates_trailing_slash_in_base() {
    let base = parse_base_url("http://host.test/api/").unwrap();
    let url = endpoint_url(&base, &["communities"]).unwrap();
    assert_eq!(url.as_str(), "http://host.test/api/communities");
}

#[test]
fn parse_base_url_rejects_garbage() {
    assert!(matches!(parse_base_url("not a url"), Err(ApiError::InvalidBaseUrl(_))));
    assert!(matches!(parse_base_url("mailto:someone@example.test"), Err(ApiError::InvalidBaseUrl(_))));
}

// =========================================================================
// Parsing
// =========================================================================

#[test]
fn parse_paged_list_response() {
    let json = format!(r#"{{"communities":[{COMMUNITY_JSON}],"pagination":{{"page":2,"pageCount":5}}}}"#);
    let page = parse_community_page(&json, 2).unwrap();
    assert_eq!(page.communities.len(), 1);
    assert_eq!(page.pagination, Pagination { page: 2, page_count: 5 });
}

#[test]
fn parse_paged_list_without_pagination_uses_requested_page() {
    let page = parse_community_page(r#"{"communities":[]}"#, 3).unwrap();
    assert_eq!(page.pagination, Pagination { page: 3, page_count: 1 });
}

#[test]
fn parse_bare_list_response() {
    let json = format!("[{COMMUNITY_JSON}]");
    let page = parse_community_page(&json, 1).unwrap();
    assert_eq!(page.communities[0].id, "c 1");
    assert_eq!(page.pagination, Pagination::default());
}

#[test]
fn decode_failure_is_server_error_with_status() {
    let err = decode::<Community>(200, "{not json").unwrap_err();
    assert!(matches!(err, ApiError::ServerError { status: 200, .. }));
}

// =========================================================================
// Draft bodies
// =========================================================================

#[test]
fn draft_without_images_is_sent_as_json() {
    let draft = CommunityDraft { name: "n".into(), category: Some(Category::Fish), ..CommunityDraft::default() };
    let body = HttpCommunityApi::draft_body(&draft).unwrap();
    let RequestBody::Json(value) = body else {
        panic!("expected json body");
    };
    assert_eq!(value["category"], "Fish");
}

#[test]
fn draft_with_images_is_sent_as_multipart() {
    let draft = CommunityDraft {
        name: "n".into(),
        cover_image: Some(ImagePreview { file_name: "c.jpg".into(), content_type: "image/jpeg".into(), bytes: vec![0xFF] }),
        ..CommunityDraft::default()
    };
    assert!(matches!(HttpCommunityApi::draft_body(&draft), Ok(RequestBody::Multipart(_))));
}

#[test]
fn invalid_image_content_type_is_a_validation_failure() {
    let image = ImagePreview { file_name: "x".into(), content_type: "not a mime".into(), bytes: vec![] };
    assert!(matches!(image_part(&image), Err(ApiError::ValidationFailed(_))));
}

// =========================================================================
// Live round trips against the one-shot responder
// =========================================================================

#[tokio::test]
async fn get_community_decodes_body_and_sends_auth_headers() {
    let (base, request) = serve_once("200 OK", COMMUNITY_JSON).await;
    let api = HttpCommunityApi::new(&base, Session::with_token("tok-9"), HttpTimeouts::default()).unwrap();

    let community = api.get_community("c 1").await.unwrap();
    assert_eq!(community.name, "Dog Lovers");

    let head = request.await.unwrap().to_ascii_lowercase();
    assert!(head.starts_with("get /api/communities/c%201 "));
    assert!(head.contains("authorization: bearer tok-9"));
    assert!(head.contains("x-request-id: "));
}

#[tokio::test]
async fn logged_out_session_sends_no_authorization() {
    let (base, request) = serve_once("200 OK", "[]").await;
    let api = HttpCommunityApi::new(&base, Session::new(), HttpTimeouts::default()).unwrap();

    let page = api.list_communities(1).await.unwrap();
    assert!(page.communities.is_empty());

    let head = request.await.unwrap().to_ascii_lowercase();
    assert!(head.starts_with("get /api/communities?page=1 "));
    assert!(!head.contains("authorization:"));
}

#[tokio::test]
async fn not_found_status_maps_to_typed_error() {
    let (base, _request) = serve_once("404 Not Found", r#"{"message":"Community not found"}"#).await;
    let api = HttpCommunityApi::new(&base, Session::new(), HttpTimeouts::default()).unwrap();

    let err = api.get_community("missing").await.unwrap_err();
    assert_eq!(err, ApiError::NotFound("Community not found".into()));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpCommunityApi::new(&format!("http://{addr}/api"), Session::new(), HttpTimeouts::default()).unwrap();
    let err = api.delete_community("c1").await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkError(_)));
}
