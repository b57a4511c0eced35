//! Hex dump formatting for opaque NAL payloads.
//!
//! Each row covers 16 bytes: an 8-digit hex offset, the hex bytes padded to
//! 47 columns, then a printable-ASCII rendering with `.` standing in for
//! non-printable bytes.

const BYTES_PER_ROW: usize = 16;

#[must_use]
pub fn dump_lines(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(BYTES_PER_ROW)
        .enumerate()
        .map(|(row, chunk)| {
            let hex = chunk
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(" ");
            let printable: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();
            format!("{:08x}  {hex:<47}  {printable}", row * BYTES_PER_ROW)
        })
        .collect()
}

#[must_use]
pub fn dump_string(bytes: &[u8]) -> String {
    let mut out = String::new();
    for line in dump_lines(bytes) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn log_dump(bytes: &[u8]) {
    for line in dump_lines(bytes) {
        tracing::debug!("{line}");
    }
}
