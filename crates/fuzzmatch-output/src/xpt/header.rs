//! Header and NAMESTR record builders.
//!
//! # Layout
//!
//! 1. Library header, real header, second header (modified datetime)
//! 2. Member header, descriptor header, member data, member second
//! 3. NAMESTR header followed by one 140-byte NAMESTR per variable
//! 4. OBS header followed by the observations
//!
//! Every section is padded with spaces to a multiple of 80 bytes.

use super::{ColumnKind, XptColumn};

/// Record length in bytes.
pub const RECORD_LEN: usize = 80;

/// NAMESTR length in bytes.
pub const NAMESTR_LEN: usize = 140;

const LIBRARY_HEADER_PREFIX: &str = "HEADER RECORD*******LIBRARY HEADER RECORD!!!!!!!";
const MEMBER_HEADER_PREFIX: &str = "HEADER RECORD*******MEMBER  HEADER RECORD!!!!!!!";
const DSCRPTR_HEADER_PREFIX: &str = "HEADER RECORD*******DSCRPTR HEADER RECORD!!!!!!!";
const NAMESTR_HEADER_PREFIX: &str = "HEADER RECORD*******NAMESTR HEADER RECORD!!!!!!!";
const OBS_HEADER_PREFIX: &str = "HEADER RECORD*******OBS     HEADER RECORD!!!!!!!";

/// Values stamped into the library and member headers.
#[derive(Debug, Clone)]
pub struct HeaderInfo {
    pub sas_version: String,
    pub os_name: String,
    /// Dataset name, already sanitized.
    pub dataset_name: String,
    pub dataset_label: String,
    /// `ddMMMyy:hh:mm:ss`
    pub created: String,
}

pub fn build_library_header() -> [u8; RECORD_LEN] {
    build_fixed_header(LIBRARY_HEADER_PREFIX)
}

/// | Offset | Field       |
/// |--------|-------------|
/// | 0-7    | "SAS"       |
/// | 8-15   | "SAS"       |
/// | 16-23  | "SASLIB"    |
/// | 24-31  | SAS version |
/// | 32-39  | OS name     |
/// | 64-79  | created     |
pub fn build_real_header(info: &HeaderInfo) -> [u8; RECORD_LEN] {
    let mut record = [b' '; RECORD_LEN];
    write_string(&mut record, 0, "SAS", 8);
    write_string(&mut record, 8, "SAS", 8);
    write_string(&mut record, 16, "SASLIB", 8);
    write_string(&mut record, 24, &info.sas_version, 8);
    write_string(&mut record, 32, &info.os_name, 8);
    write_string(&mut record, 64, &info.created, 16);
    record
}

/// Modified datetime at offset 0. Result files are never modified after
/// creation, so it repeats the created stamp.
pub fn build_second_header(info: &HeaderInfo) -> [u8; RECORD_LEN] {
    let mut record = [b' '; RECORD_LEN];
    write_string(&mut record, 0, &info.created, 16);
    record
}

pub fn build_member_header() -> [u8; RECORD_LEN] {
    let mut record = build_fixed_header(MEMBER_HEADER_PREFIX);
    write_string(&mut record, 64, "0160", 4);
    write_string(&mut record, 74, &format!("{NAMESTR_LEN:04}"), 4);
    record
}

pub fn build_dscrptr_header() -> [u8; RECORD_LEN] {
    build_fixed_header(DSCRPTR_HEADER_PREFIX)
}

pub fn build_member_data(info: &HeaderInfo) -> [u8; RECORD_LEN] {
    let mut record = [b' '; RECORD_LEN];
    write_string(&mut record, 0, "SAS", 8);
    write_string(&mut record, 8, &info.dataset_name, 8);
    write_string(&mut record, 16, "SASDATA", 8);
    write_string(&mut record, 24, &info.sas_version, 8);
    write_string(&mut record, 32, &info.os_name, 8);
    write_string(&mut record, 64, &info.created, 16);
    record
}

pub fn build_member_second(info: &HeaderInfo) -> [u8; RECORD_LEN] {
    let mut record = [b' '; RECORD_LEN];
    write_string(&mut record, 0, &info.created, 16);
    write_string(&mut record, 32, &info.dataset_label, 40);
    record
}

pub fn build_namestr_header(var_count: usize) -> [u8; RECORD_LEN] {
    let mut record = build_fixed_header(NAMESTR_HEADER_PREFIX);
    write_string(&mut record, 54, &format!("{var_count:04}"), 4);
    record
}

pub fn build_obs_header() -> [u8; RECORD_LEN] {
    build_fixed_header(OBS_HEADER_PREFIX)
}

/// Build the NAMESTR for one variable.
///
/// | Offset | Field  | Notes                        |
/// |--------|--------|------------------------------|
/// | 0-1    | ntype  | 1=numeric, 2=character       |
/// | 4-5    | nlng   | length in the observation    |
/// | 6-7    | nvar0  | variable number, 1-based     |
/// | 8-15   | nname  |                              |
/// | 16-55  | nlabel |                              |
/// | 56-63  | nform  | blank                        |
/// | 68-69  | nfj    | 0=left, 1=right              |
/// | 72-79  | niform | blank                        |
/// | 84-87  | npos   | byte offset in observation   |
pub fn build_namestr(column: &XptColumn, varnum: u16, position: u32) -> [u8; NAMESTR_LEN] {
    let mut buf = [0u8; NAMESTR_LEN];
    let (ntype, justification) = match column.kind {
        ColumnKind::Numeric => (1i16, 1i16),
        ColumnKind::Char => (2, 0),
    };

    write_i16(&mut buf, 0, ntype);
    write_i16(&mut buf, 4, column.length as i16);
    write_i16(&mut buf, 6, varnum as i16);
    write_string(&mut buf, 8, &column.name, 8);
    write_string(&mut buf, 16, &column.label, 40);
    write_string(&mut buf, 56, "", 8);
    write_i16(&mut buf, 68, justification);
    write_string(&mut buf, 72, "", 8);
    write_i32(&mut buf, 84, position as i32);
    buf
}

/// Prefix in bytes 0-47, ASCII zeros in 48-77, spaces after.
fn build_fixed_header(prefix: &str) -> [u8; RECORD_LEN] {
    let mut record = [b' '; RECORD_LEN];
    let bytes = prefix.as_bytes();
    let len = bytes.len().min(48);
    record[..len].copy_from_slice(&bytes[..len]);
    record[48..78].fill(b'0');
    record
}

/// Write `value` space-padded to `len` bytes; non-ASCII becomes `?`.
fn write_string(buf: &mut [u8], offset: usize, value: &str, len: usize) {
    let field = &mut buf[offset..offset + len];
    field.fill(b' ');
    for (slot, ch) in field.iter_mut().zip(value.chars()) {
        *slot = if ch.is_ascii() { ch as u8 } else { b'?' };
    }
}

fn write_i16(buf: &mut [u8], offset: usize, value: i16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

fn write_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}
