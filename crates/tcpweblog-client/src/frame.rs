//! Record framing.
//!
//! Wire format, one record per line:
//! ```text
//! @@<stream-name>\t<cluster-id>\t<client-ip>\t<client-host>\t<payload>\n
//! ```
//! There is no length prefix; the trailing newline ends the record. A framed
//! record never exceeds [`MAX_FRAME_LEN`] bytes including that newline.

use crate::error::{ClientError, ClientResult};

/// Prefix of every framed record.
pub const SENTINEL: &[u8; 2] = b"@@";

/// Separator between the routing fields and the payload.
pub const FIELD_SEPARATOR: u8 = b'\t';

/// Upper bound on a framed record, newline included.
pub const MAX_FRAME_LEN: usize = 65_536;

/// Routing metadata attached to every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTags {
    /// Logical log file name, e.g. `access.log`.
    pub stream_name: String,
    /// Cluster grouping number.
    pub cluster_id: i64,
    /// Address of the producing node, or a placeholder such as `-`.
    pub client_ip: String,
    /// Hostname of the producing node, or a placeholder such as `-`.
    pub client_host: String,
}

impl RecordTags {
    /// Reject tags that would corrupt the line framing.
    pub fn validate(&self) -> ClientResult<()> {
        let fields = [
            ("logname", &self.stream_name),
            ("client_ip", &self.client_ip),
            ("client_hostname", &self.client_host),
        ];
        for (name, value) in fields {
            if value.bytes().any(|b| b == FIELD_SEPARATOR || b == b'\n' || b == b'\r') {
                return Err(ClientError::Config(format!(
                    "{} must not contain tabs or line breaks: {:?}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    fn write_header(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(SENTINEL);
        buf.extend_from_slice(self.stream_name.as_bytes());
        buf.push(FIELD_SEPARATOR);
        buf.extend_from_slice(self.cluster_id.to_string().as_bytes());
        buf.push(FIELD_SEPARATOR);
        buf.extend_from_slice(self.client_ip.as_bytes());
        buf.push(FIELD_SEPARATOR);
        buf.extend_from_slice(self.client_host.as_bytes());
        buf.push(FIELD_SEPARATOR);
    }
}

/// A record ready for the wire and the overflow file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedMessage {
    bytes: Vec<u8>,
    truncated: bool,
}

impl FramedMessage {
    /// Frame one input line.
    ///
    /// `payload` may or may not carry its trailing newline; the frame always
    /// ends with exactly one. Payloads that would push the frame past
    /// [`MAX_FRAME_LEN`] are cut short.
    pub fn build(tags: &RecordTags, payload: &[u8]) -> Self {
        let body = payload.strip_suffix(b"\n").unwrap_or(payload);

        let mut bytes = Vec::with_capacity(MAX_FRAME_LEN.min(64 + body.len()));
        tags.write_header(&mut bytes);

        let room = MAX_FRAME_LEN.saturating_sub(bytes.len() + 1);
        let truncated = body.len() > room;
        bytes.extend_from_slice(&body[..body.len().min(room)]);
        bytes.push(b'\n');

        Self { bytes, truncated }
    }

    /// Split a framed line back into its tags and payload.
    ///
    /// The payload keeps its trailing newline. Returns `None` for lines that
    /// are not sentinel-prefixed records.
    pub fn parse(line: &[u8]) -> Option<(RecordTags, &[u8])> {
        let rest = line.strip_prefix(SENTINEL)?;
        let mut fields = rest.splitn(5, |b| *b == FIELD_SEPARATOR);

        let stream_name = std::str::from_utf8(fields.next()?).ok()?;
        let cluster_id = std::str::from_utf8(fields.next()?).ok()?.parse().ok()?;
        let client_ip = std::str::from_utf8(fields.next()?).ok()?;
        let client_host = std::str::from_utf8(fields.next()?).ok()?;
        let payload = fields.next()?;

        let tags = RecordTags {
            stream_name: stream_name.to_string(),
            cluster_id,
            client_ip: client_ip.to_string(),
            client_host: client_host.to_string(),
        };
        Some((tags, payload))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the payload was cut to fit [`MAX_FRAME_LEN`].
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> RecordTags {
        RecordTags {
            stream_name: "access.log".to_string(),
            cluster_id: 1,
            client_ip: "10.0.2.15".to_string(),
            client_host: "xhost".to_string(),
        }
    }

    #[test]
    fn test_build_matches_wire_format() {
        let frame = FramedMessage::build(&tags(), b"GET / HTTP/1.1 200\n");
        assert_eq!(
            frame.as_bytes(),
            b"@@access.log\t1\t10.0.2.15\txhost\tGET / HTTP/1.1 200\n"
        );
        assert!(!frame.is_truncated());
    }

    #[test]
    fn test_build_terminates_unterminated_payload() {
        let frame = FramedMessage::build(&tags(), b"last line");
        assert_eq!(
            frame.as_bytes(),
            b"@@access.log\t1\t10.0.2.15\txhost\tlast line\n"
        );
    }

    #[test]
    fn test_build_negative_cluster_and_placeholders() {
        let tags = RecordTags {
            stream_name: "varnish.log".to_string(),
            cluster_id: -3,
            client_ip: "-".to_string(),
            client_host: "-".to_string(),
        };
        let frame = FramedMessage::build(&tags, b"x\n");
        assert_eq!(frame.as_bytes(), b"@@varnish.log\t-3\t-\t-\tx\n");
    }

    #[test]
    fn test_payload_tabs_survive_round_trip() {
        let payload: &[u8] = b"a\tb\tc \xff\xfe raw bytes\n";
        let frame = FramedMessage::build(&tags(), payload);

        let (parsed_tags, parsed_payload) = FramedMessage::parse(frame.as_bytes()).unwrap();
        assert_eq!(parsed_tags, tags());
        assert_eq!(parsed_payload, payload);
    }

    #[test]
    fn test_round_trip_across_tag_and_payload_shapes() {
        let cases: [(&str, i64, &str, &str, &[u8]); 8] = [
            ("access.log", 1, "10.0.2.15", "xhost", b"GET / HTTP/1.1 200\n"),
            ("access.log", 1, "10.0.2.15", "xhost", b"\n"),
            ("a", 0, "b", "c", b"x\n"),
            ("error.log", -7, "-", "-", b"\t\t\t\n"),
            ("ssl.access.log", i64::MAX, "fd00::15", "web-01", b"\xff\xfe\x00raw\n"),
            ("varnish.log", i64::MIN, "-", "-", b"a\tb\tc\td\te\n"),
            ("x", 42, "::1", "h", b"@@nested\t1\t-\t-\tframe\n"),
            ("access.log", 3, "", "", b"empty tags\n"),
        ];

        for (stream_name, cluster_id, client_ip, client_host, payload) in cases {
            let tags = RecordTags {
                stream_name: stream_name.to_string(),
                cluster_id,
                client_ip: client_ip.to_string(),
                client_host: client_host.to_string(),
            };
            let frame = FramedMessage::build(&tags, payload);

            let mut expected = format!(
                "@@{}\t{}\t{}\t{}\t",
                stream_name, cluster_id, client_ip, client_host
            )
            .into_bytes();
            expected.extend_from_slice(payload);
            assert_eq!(frame.as_bytes(), expected.as_slice(), "{:?}", tags);

            let (parsed_tags, parsed_payload) = FramedMessage::parse(frame.as_bytes()).unwrap();
            assert_eq!(parsed_tags, tags);
            assert_eq!(parsed_payload, payload);
        }
    }

    #[test]
    fn test_empty_payload_still_ends_the_line() {
        let frame = FramedMessage::build(&tags(), b"");
        assert_eq!(frame.as_bytes(), b"@@access.log\t1\t10.0.2.15\txhost\t\n");

        let (_, payload) = FramedMessage::parse(frame.as_bytes()).unwrap();
        assert_eq!(payload, b"\n");
    }

    #[test]
    fn test_oversized_payload_is_truncated_to_cap() {
        let payload = vec![b'a'; MAX_FRAME_LEN * 2];
        let frame = FramedMessage::build(&tags(), &payload);

        assert_eq!(frame.len(), MAX_FRAME_LEN);
        assert!(frame.is_truncated());
        assert_eq!(frame.as_bytes().last(), Some(&b'\n'));
        assert!(frame.as_bytes().starts_with(b"@@access.log\t"));
    }

    #[test]
    fn test_payload_exactly_at_cap_is_kept() {
        let header_len = FramedMessage::build(&tags(), b"").len() - 1;
        let payload = vec![b'z'; MAX_FRAME_LEN - header_len - 1];
        let frame = FramedMessage::build(&tags(), &payload);

        assert_eq!(frame.len(), MAX_FRAME_LEN);
        assert!(!frame.is_truncated());
    }

    #[test]
    fn test_parse_rejects_non_records() {
        assert!(FramedMessage::parse(b"GET / HTTP/1.1 200\n").is_none());
        assert!(FramedMessage::parse(b"#@access.log\t1\t-\t-\tx\n").is_none());
        assert!(FramedMessage::parse(b"@@access.log\tnot-a-number\t-\t-\tx\n").is_none());
        assert!(FramedMessage::parse(b"@@access.log\t1\t-\n").is_none());
    }

    #[test]
    fn test_validate_rejects_separators() {
        assert!(tags().validate().is_ok());

        let mut bad = tags();
        bad.stream_name = "access\tlog".to_string();
        assert!(matches!(bad.validate(), Err(ClientError::Config(_))));

        let mut bad = tags();
        bad.client_host = "x\nhost".to_string();
        assert!(bad.validate().is_err());
    }
}
