use miniwire::codec::read_response;
use miniwire::network::EndpointRef;
use proptest::prelude::*;
use tokio::io::BufReader;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: parsing the canonical form of a parsed URL gives the same endpoint
    #[test]
    fn endpoint_round_trip_is_stable(
        host in "[a-z][a-z0-9.-]{0,20}",
        port in any::<u16>(),
        explicit_port in any::<bool>(),
        path in "(/[A-Za-z0-9._~=?&-]{0,10}){0,4}",
    ) {
        let url = if explicit_port {
            format!("http://{host}:{port}{path}")
        } else {
            format!("http://{host}{path}")
        };

        let endpoint = EndpointRef::parse(&url).unwrap();
        prop_assert_eq!(endpoint.host(), host.as_str());
        prop_assert_eq!(endpoint.port(), if explicit_port { port } else { 80 });
        prop_assert!(endpoint.path().starts_with('/'));

        let reparsed = EndpointRef::parse(&endpoint.to_string()).unwrap();
        prop_assert_eq!(&reparsed, &endpoint);
        prop_assert_eq!(reparsed.to_string(), endpoint.to_string());
    }

    /// Property: a declared length caps the body and a short stream is returned as-is
    #[test]
    fn body_is_truncated_to_what_arrived(
        body in "[ -~]{0,64}",
        declared in 0usize..96,
    ) {
        let raw = format!("HTTP/1.1 200 OK\r\nContent-Length: {declared}\r\n\r\n{body}");
        let response = tokio_test::block_on(async {
            let mut reader = BufReader::new(raw.as_bytes());
            read_response(&mut reader).await
        }).unwrap();

        let expected = &body[..declared.min(body.len())];
        prop_assert_eq!(response.body.as_str(), expected);
    }

    /// Property: header lines without a ": " separator never fail the parse
    #[test]
    fn malformed_header_lines_are_ignored(
        junk in prop::collection::vec("[A-Za-z0-9-]{1,12}", 0..8),
    ) {
        let mut raw = String::from("HTTP/1.1 204 No Content\r\n");
        for line in &junk {
            raw.push_str(line);
            raw.push_str("\r\n");
        }
        raw.push_str("Content-Length: 0\r\n\r\n");

        let response = tokio_test::block_on(async {
            let mut reader = BufReader::new(raw.as_bytes());
            read_response(&mut reader).await
        }).unwrap();

        prop_assert_eq!(response.status_code, 204);
        prop_assert_eq!(response.headers.len(), 1);
        prop_assert_eq!(response.header("Content-Length"), Some("0"));
    }
}
