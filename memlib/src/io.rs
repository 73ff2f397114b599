use std::fs::File;
use std::io::Read;
use std::path::Path;
use lazy_static::lazy_static;
use regex::Regex;
use crate::error::TraceError;

lazy_static! {
    static ref ADDRESS_LINE: Regex = Regex::new(r"^(?:0[xX](?P<hex>[0-9a-fA-F]+)|(?P<dec>[0-9]+))$").unwrap();
    static ref COMMAND_LINE: Regex = Regex::new(r"^(?P<op>alloc|malloc|free)\s+(?P<arg>[0-9]+)$").unwrap();
}

/// One step of an allocation script
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Command {
    /// Request this many bytes
    Allocate(u64),
    /// Release an owner id (contiguous) or block address (buddy)
    Free(u64),
}

/// Opens a file for a single sequential pass
pub fn get_reader(file: File) -> Result<Box<dyn Read>, TraceError> {
    // Mapping a zero length file fails on most systems
    if file.metadata()?.len() == 0 {
        return Ok(Box::new(std::io::empty()));
    }
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        Ok(Box::new(BufReader::new(file)))
    }
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        unsafe {
            let m = Mmap::map(&file)?;
            m.advise(Advice::Sequential)?;
            Ok(Box::new(Cursor::new(m)))
        }
    }
}

/// Reads a whole file as text through `get_reader`
pub fn read_text(path: impl AsRef<Path>) -> Result<String, TraceError> {
    let mut reader = get_reader(File::open(path)?)?;
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}

/// Loads an address trace file, see `parse_trace`
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<u64>, TraceError> {
    parse_trace(&read_text(path)?)
}

/// Loads an allocation script file, see `parse_script`
pub fn load_script(path: impl AsRef<Path>) -> Result<Vec<Command>, TraceError> {
    parse_script(&read_text(path)?)
}

/// Parses a decimal or `0x` prefixed hexadecimal address
///
/// # Examples
///
/// ```
/// use memlib::io::parse_address;
/// assert_eq!(parse_address("70"), Some(70));
/// assert_eq!(parse_address("0x46"), Some(70));
/// assert_eq!(parse_address("0xZZ"), None);
/// ```
pub fn parse_address(text: &str) -> Option<u64> {
    let captures = ADDRESS_LINE.captures(text)?;
    if let Some(hex) = captures.name("hex") {
        u64::from_str_radix(hex.as_str(), 16).ok()
    } else {
        captures.name("dec")?.as_str().parse().ok()
    }
}

/// Parses a trace with one address per line
///
/// Blank lines and anything after a `#` are ignored. The first line that isn't an address is
/// reported with its 1-based line number
pub fn parse_trace(text: &str) -> Result<Vec<u64>, TraceError> {
    content_lines(text)
        .map(|(line, content)| parse_address(content).ok_or_else(|| malformed(line, content)))
        .collect()
}

/// Parses an allocation script of `alloc <size>`, `malloc <size>` and `free <id>` lines
///
/// # Examples
///
/// ```
/// use memlib::io::{parse_script, Command};
/// let script = parse_script("alloc 100 # first\n\nfree 1\n").unwrap();
/// assert_eq!(script, vec![Command::Allocate(100), Command::Free(1)]);
/// ```
pub fn parse_script(text: &str) -> Result<Vec<Command>, TraceError> {
    content_lines(text)
        .map(|(line, content)| {
            let captures = COMMAND_LINE.captures(content).ok_or_else(|| malformed(line, content))?;
            let arg = captures["arg"].parse().map_err(|_| malformed(line, content))?;
            Ok(match &captures["op"] {
                "free" => Command::Free(arg),
                _ => Command::Allocate(arg),
            })
        })
        .collect()
}

/// Non-empty lines with comments stripped, paired with their 1-based line number
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, content)| !content.is_empty())
}

fn malformed(line: usize, content: &str) -> TraceError {
    TraceError::Malformed { line, content: content.to_string() }
}
