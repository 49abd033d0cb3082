use liteserve::http::response::{ResponseBuilder, StatusCode};
use liteserve::http::writer::{ResponseWriter, serialize_response};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
}

#[test]
fn test_response_builder_basic() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(b"Hello, World!".to_vec())
        .build();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body_bytes(), b"Hello, World!");
}

#[test]
fn test_response_builder_keeps_header_order() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Connection", "close")
        .header("Server", "liteserve")
        .header("Content-Type", "text/html")
        .build();

    let names: Vec<&str> = response.headers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, vec!["Connection", "Server", "Content-Type"]);
    assert_eq!(response.header("content-type"), Some("text/html"));
}

#[test]
fn test_response_without_body() {
    let response = ResponseBuilder::new(StatusCode::Ok).build();
    assert!(response.body.is_none());
    assert!(response.body_bytes().is_empty());
}

#[test]
fn test_serialize_response_wire_format() {
    let response = ResponseBuilder::new(StatusCode::NotFound)
        .header("Connection", "close")
        .header("Server", "liteserve")
        .body(StatusCode::NotFound.to_string())
        .build();

    let wire = String::from_utf8(serialize_response(&response)).unwrap();
    assert_eq!(
        wire,
        "HTTP/1.0 404 Not Found\r\n\
         Connection: close\r\n\
         Server: liteserve\r\n\
         \r\n\
         404 Not Found\r\n"
    );
}

#[test]
fn test_serialize_head_response_has_no_body() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Connection", "close")
        .build();

    let wire = serialize_response(&response);
    assert_eq!(wire, b"HTTP/1.0 200 OK\r\nConnection: close\r\n\r\n\r\n".to_vec());
}

#[test]
fn test_binary_body_is_written_unchanged() {
    let body: Vec<u8> = (0u8..=255).collect();
    let response = ResponseBuilder::new(StatusCode::Ok).body(body.clone()).build();

    let wire = serialize_response(&response);
    let head_end = wire.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    assert_eq!(&wire[head_end..wire.len() - 2], body.as_slice());
}

#[tokio::test]
async fn test_response_writer_writes_everything() {
    let response = ResponseBuilder::new(StatusCode::Ok).body("abc").build();
    let mut writer = ResponseWriter::new(&response);
    let expected = serialize_response(&response);

    let mut sink = Vec::new();
    writer.write_to_stream(&mut sink).await.unwrap();

    assert_eq!(sink, expected);
    assert_eq!(writer.len(), expected.len());
}
