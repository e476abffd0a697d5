// logsleuth-analyzer - export.rs
//
// Two export sinks: plain/JSON line export (one rendered line per input
// line, raw-line/json-full/json-single-params via translators::translate),
// and PCAP export for commands that synthesize network traffic (currently
// just SIP flows). PCAP framing goes through the `pcap-file` crate; the
// Linux Cooked Capture + IPv4/UDP headers inside each packet's payload are
// built by hand, since pcap-file only owns the outer capture-file framing.

use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use pcap_file::DataLink;

use crate::commands::{CommandResult, NetworkPacket};
use crate::repo::LinesRepo;
use crate::translators::{OutputFormat, RenderMode};
use crate::util::constants::PCAP_SNAPLEN;
use crate::util::error::{ExportError, Result as EngineResult};

/// Writes one rendered line per entry in `indices` (or every line in the
/// repo if `indices` is empty) to `path`, in the given render mode/format.
pub fn export_lines(
    repo: &LinesRepo,
    indices: &[usize],
    mode: RenderMode,
    format: OutputFormat,
    path: &Path,
    append: bool,
) -> EngineResult<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let targets: Box<dyn Iterator<Item = usize>> = if indices.is_empty() {
        Box::new(0..repo.num_lines())
    } else {
        Box::new(indices.iter().copied())
    };

    for index in targets {
        let Some(line) = repo.line(index) else {
            continue;
        };
        let text = crate::translators::translate(repo, line, mode, format);
        writeln!(file, "{text}").map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }

    Ok(())
}

/// Exports every line a command result touched, across all its groups.
pub fn export_command_lines(
    repo: &LinesRepo,
    result: &CommandResult,
    mode: RenderMode,
    format: OutputFormat,
    path: &Path,
    append: bool,
) -> EngineResult<()> {
    let mut indices: Vec<usize> = result
        .lines_indices
        .iter()
        .flat_map(|group| group.indices.iter().copied())
        .collect();
    indices.sort_unstable();
    indices.dedup();
    export_lines(repo, &indices, mode, format, path, append)
}

/// Writes every synthesized network packet in `result` as a PCAP capture,
/// resolving each packet's `LineContentRef` against `repo` at export time.
pub fn export_command_network_packets(
    repo: &LinesRepo,
    result: &CommandResult,
    path: &Path,
) -> EngineResult<()> {
    if result.network_packets.is_empty() {
        return Err(ExportError::MalformedEnvelope {
            reason: "command result carries no network packets".into(),
        }
        .into());
    }

    let file = std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let header = PcapHeader {
        datalink: DataLink::LINUX_SLL,
        snaplen: PCAP_SNAPLEN,
        ..Default::default()
    };
    let mut writer = PcapWriter::with_header(file, header).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::Other, source.to_string()),
    })?;

    for packet in &result.network_packets {
        let payload = resolve_packet_payload(repo, packet)?;
        let frame = build_frame(packet, &payload)?;
        let secs = (packet.timestamp / 1000).max(0) as u32;
        let micros = ((packet.timestamp % 1000) * 1000).max(0) as u32;
        let pcap_packet = PcapPacket::new_owned(
            std::time::Duration::new(secs as u64, micros * 1000),
            frame.len() as u32,
            frame,
        );
        writer
            .write_packet(&pcap_packet)
            .map_err(|source| ExportError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, source.to_string()),
            })?;
    }

    Ok(())
}

/// Resolves a packet's `LineContentRef` pointer into actual bytes: always a
/// slice of the referencing line's own raw content, never a copy made
/// anywhere else.
fn resolve_packet_payload(repo: &LinesRepo, packet: &NetworkPacket) -> EngineResult<Vec<u8>> {
    let line_ref = packet.line;
    let line = repo.line(line_ref.index).ok_or(ExportError::MalformedEnvelope {
        reason: format!("network packet references missing line {}", line_ref.index),
    })?;
    let bytes = repo.bytes_for(line);
    let start = line.data.start + line_ref.offset;
    let end = start + line_ref.size;
    if end > line.data.end || end > bytes.len() {
        return Err(ExportError::MalformedEnvelope {
            reason: format!("network packet content range out of bounds on line {}", line_ref.index),
        }
        .into());
    }
    Ok(bytes[start..end].to_vec())
}

fn parse_endpoint(raw: &str) -> EngineResult<SocketAddr> {
    raw.parse::<SocketAddr>()
        .map_err(|_| ExportError::MalformedEnvelope {
            reason: format!("network packet endpoint {raw:?} is not a valid socket address"),
        }
        .into())
}

/// Linux Cooked Capture header + IPv4 + UDP wrapping a packet's payload.
fn build_frame(packet: &NetworkPacket, payload: &[u8]) -> EngineResult<Vec<u8>> {
    let source = parse_endpoint(&packet.endpoints[0])?;
    let destination = parse_endpoint(&packet.endpoints[1])?;

    let mut sll = Vec::with_capacity(16);
    sll.extend_from_slice(&0u16.to_be_bytes()); // packet_type: outgoing/unknown
    sll.extend_from_slice(&0u16.to_be_bytes()); // arphrd_type
    sll.extend_from_slice(&0u16.to_be_bytes()); // address_len
    sll.extend_from_slice(&[0u8; 8]); // address
    sll.extend_from_slice(&0x0800u16.to_be_bytes()); // protocol: IPv4

    let udp_len = 8 + payload.len();
    let mut udp = Vec::with_capacity(udp_len);
    udp.extend_from_slice(&port_of(&source).to_be_bytes());
    udp.extend_from_slice(&port_of(&destination).to_be_bytes());
    udp.extend_from_slice(&(udp_len as u16).to_be_bytes());
    udp.extend_from_slice(&0u16.to_be_bytes()); // checksum left unset (optional for IPv4)
    udp.extend_from_slice(payload);

    let total_length = 20 + udp.len();
    let mut ip = Vec::with_capacity(20);
    ip.push(0x45); // version 4, header length 5 words
    ip.push(0); // tos
    ip.extend_from_slice(&(total_length as u16).to_be_bytes());
    ip.extend_from_slice(&0u16.to_be_bytes()); // id
    ip.extend_from_slice(&0x4000u16.to_be_bytes()); // don't-fragment
    ip.push(128); // ttl
    ip.push(17); // protocol: UDP
    ip.extend_from_slice(&0u16.to_be_bytes()); // checksum, filled below
    ip.extend_from_slice(&ipv4_octets(&source));
    ip.extend_from_slice(&ipv4_octets(&destination));
    let checksum = internet_checksum(&ip);
    ip[10] = (checksum >> 8) as u8;
    ip[11] = (checksum & 0xff) as u8;

    let mut frame = Vec::with_capacity(sll.len() + ip.len() + udp.len());
    frame.extend_from_slice(&sll);
    frame.extend_from_slice(&ip);
    frame.extend_from_slice(&udp);
    Ok(frame)
}

fn port_of(addr: &SocketAddr) -> u16 {
    addr.port()
}

fn ipv4_octets(addr: &SocketAddr) -> [u8; 4] {
    match addr.ip() {
        IpAddr::V4(v4) => v4.octets(),
        IpAddr::V6(_) => [0, 0, 0, 0],
    }
}

fn internet_checksum(bytes: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut iter = bytes.chunks_exact(2);
    for chunk in &mut iter {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }
    if let [last] = iter.remainder() {
        sum += (*last as u32) << 8;
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_of_empty_is_all_ones() {
        assert_eq!(internet_checksum(&[]), 0xffff);
    }
}
