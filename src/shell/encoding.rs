//! Output text normalisation.
//!
//! `wsl.exe` writes UTF-16LE without a byte-order mark, while PowerShell
//! and Linux tools write UTF-8. Every captured stream passes through
//! [`decode_output`] before anything searches it for keywords.

/// Decode raw process output into a UTF-8 `String`.
pub fn decode_output(bytes: &[u8]) -> String {
    let text = if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        decode_utf16le(rest)
    } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else if looks_like_utf16le(bytes) {
        decode_utf16le(bytes)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    };

    text.replace('\0', "")
}

/// Heuristic: ASCII-heavy UTF-16LE has a zero high byte in most code units.
fn looks_like_utf16le(bytes: &[u8]) -> bool {
    if bytes.len() < 2 {
        return false;
    }
    let units = bytes.len() / 2;
    let zero_high = bytes
        .chunks_exact(2)
        .filter(|pair| pair[1] == 0 && pair[0] != 0)
        .count();
    zero_high * 2 > units
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn plain_utf8_passes_through() {
        assert_eq!(decode_output(b"Ubuntu-24.04\n"), "Ubuntu-24.04\n");
    }

    #[test]
    fn utf16le_without_bom_is_detected() {
        let bytes = utf16le("Ubuntu-24.04\r\ndocker-desktop\r\n");
        let text = decode_output(&bytes);
        assert!(text.contains("Ubuntu-24.04"));
        assert!(text.contains("docker-desktop"));
    }

    #[test]
    fn utf16le_with_bom_is_decoded() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(utf16le("Default Version: 2"));
        assert_eq!(decode_output(&bytes), "Default Version: 2");
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("10.0.22631".as_bytes());
        assert_eq!(decode_output(&bytes), "10.0.22631");
    }

    #[test]
    fn stray_nuls_are_removed() {
        assert_eq!(decode_output(b"abc\0"), "abc");
    }

    #[test]
    fn invalid_utf8_is_lossy_not_fatal() {
        let text = decode_output(&[b'o', b'k', 0xC3]);
        assert!(text.starts_with("ok"));
    }

    #[test]
    fn non_ascii_utf8_is_preserved() {
        assert_eq!(decode_output("Grafikkarte: ä".as_bytes()), "Grafikkarte: ä");
    }
}
