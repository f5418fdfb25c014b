//! File and serializer handles reachable from script code.
//!
//! Handles live in a [`FileTable`]: a list guarded by one structural lock,
//! whose entries each carry their own lock. Callers resolve a handle under
//! the list lock, take a clone of its [`Arc`], release the list lock and
//! only then lock the entry. Closing a handle leaves a tombstone so the
//! indices of other open handles never move.
//!
//! Slot 0 always holds the [`Serializer`], which backs `@serialize`.

use std::path::Path;
use std::sync::Arc;

use jsfx_config::Config;
use jsfx_core::audio::has_extension;
use jsfx_core::text::{parse_leading_f64, trim_ascii};
use jsfx_core::{AudioFormat, AudioReader, RiffInfo};
use parking_lot::Mutex;

/// Handle index of the serializer.
pub const SERIALIZER_HANDLE: u32 = 0;

/// Kind of file a path refers to, as far as scripts are concerned.
#[derive(Clone)]
pub enum FileType {
    /// Not openable.
    None,
    /// `.txt`: whitespace or comma separated numbers.
    Text,
    /// `.raw`: little-endian `f32` values.
    Raw,
    /// Audio, read by the given codec.
    Audio(Arc<dyn AudioFormat>),
}

impl std::fmt::Debug for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FileType::None => "None",
            FileType::Text => "Text",
            FileType::Raw => "Raw",
            FileType::Audio(_) => "Audio",
        })
    }
}

impl FileType {
    /// Whether scripts can open this file.
    pub fn is_some(&self) -> bool {
        !matches!(self, FileType::None)
    }
}

/// Classify `path`: text and raw suffixes first, then each registered codec.
pub fn detect_file_type(config: &Config, path: &Path) -> FileType {
    if has_extension(path, "txt") {
        return FileType::Text;
    }
    if has_extension(path, "raw") {
        return FileType::Raw;
    }
    config
        .audio_formats()
        .iter()
        .find(|format| format.can_handle(path))
        .map_or(FileType::None, |format| FileType::Audio(Arc::clone(format)))
}

/// Direction of a serializer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialMode {
    /// Restoring state: script calls read from the buffer.
    Read,
    /// Saving state: script calls append to the buffer.
    Write,
}

/// The state buffer `@serialize` reads from or writes to.
///
/// Values are stored as little-endian `f32`; strings as a little-endian
/// `u32` byte length followed by the bytes.
#[derive(Debug, Default)]
pub struct Serializer {
    mode: Option<SerialMode>,
    data: Vec<u8>,
    pos: usize,
}

impl Serializer {
    /// Start a pass over `data`.
    pub fn begin(&mut self, mode: SerialMode, data: Vec<u8>) {
        self.mode = Some(mode);
        self.data = data;
        self.pos = 0;
    }

    /// Finish the pass, returning the buffer.
    pub fn end(&mut self) -> Vec<u8> {
        self.mode = None;
        self.pos = 0;
        std::mem::take(&mut self.data)
    }

    /// Current pass direction.
    pub fn mode(&self) -> Option<SerialMode> {
        self.mode
    }

    fn read_bytes(&mut self, len: usize) -> Option<&[u8]> {
        let bytes = self.data.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(bytes)
    }

    fn read_f32(&mut self) -> Option<f32> {
        let bytes = self.read_bytes(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Some(f32::from_le_bytes(raw))
    }

    fn var(&mut self, value: &mut f64) -> bool {
        match self.mode {
            Some(SerialMode::Write) => {
                self.data.extend_from_slice(&(*value as f32).to_le_bytes());
                true
            }
            Some(SerialMode::Read) => match self.read_f32() {
                Some(v) => {
                    *value = f64::from(v);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    fn string(&mut self, text: &mut String) -> bool {
        match self.mode {
            Some(SerialMode::Write) => {
                let Ok(len) = u32::try_from(text.len()) else {
                    return false;
                };
                self.data.extend_from_slice(&len.to_le_bytes());
                self.data.extend_from_slice(text.as_bytes());
                true
            }
            Some(SerialMode::Read) => {
                let start = self.pos;
                let Some(len) = self.read_bytes(4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]])) else {
                    return false;
                };
                match self.read_bytes(len as usize) {
                    Some(bytes) => {
                        *text = String::from_utf8_lossy(bytes).into_owned();
                        true
                    }
                    None => {
                        self.pos = start;
                        false
                    }
                }
            }
            None => false,
        }
    }

    fn avail(&self) -> i64 {
        match self.mode {
            Some(SerialMode::Write) => -1,
            Some(SerialMode::Read) => ((self.data.len() - self.pos) / 4) as i64,
            None => 0,
        }
    }
}

/// A `.raw` file held in memory.
#[derive(Debug)]
pub struct RawFile {
    data: Vec<u8>,
    pos: usize,
}

impl RawFile {
    fn read(&mut self, value: &mut f64) -> bool {
        let Some(bytes) = self.data.get(self.pos..self.pos + 4) else {
            return false;
        };
        *value = f64::from(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
        self.pos += 4;
        true
    }
}

/// A `.txt` file held in memory.
#[derive(Debug)]
pub struct TextFile {
    text: String,
    pos: usize,
}

impl TextFile {
    /// A digit, or a sign or dot leading into one.
    fn is_number_start(bytes: &[u8], pos: usize) -> bool {
        let digit_at = |i: usize| bytes.get(i).is_some_and(u8::is_ascii_digit);
        match bytes[pos] {
            b'0'..=b'9' => true,
            b'.' => digit_at(pos + 1),
            b'-' | b'+' => digit_at(pos + 1) || (bytes.get(pos + 1) == Some(&b'.') && digit_at(pos + 2)),
            _ => false,
        }
    }

    /// Position of the next number at or after `from`, skipping separators
    /// and `//` comments.
    fn next_number(&self, mut from: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        while from < bytes.len() {
            let b = bytes[from];
            if b == b'/' && bytes.get(from + 1) == Some(&b'/') {
                while from < bytes.len() && bytes[from] != b'\n' {
                    from += 1;
                }
            } else if Self::is_number_start(bytes, from) {
                return Some(from);
            } else {
                from += 1;
            }
        }
        None
    }

    fn number_end(&self, start: usize) -> usize {
        let bytes = self.text.as_bytes();
        let mut pos = start + 1;
        while let Some(&b) = bytes.get(pos) {
            let exponent_sign = matches!(b, b'-' | b'+') && matches!(bytes[pos - 1], b'e' | b'E');
            if !(b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E') || exponent_sign) {
                break;
            }
            pos += 1;
        }
        pos
    }

    fn read(&mut self, value: &mut f64) -> bool {
        let Some(start) = self.next_number(self.pos) else {
            self.pos = self.text.len();
            return false;
        };
        let end = self.number_end(start);
        *value = parse_leading_f64(&self.text[start..end]);
        self.pos = end;
        true
    }

    fn avail(&self) -> i64 {
        let mut count = 0;
        let mut pos = self.pos;
        while let Some(start) = self.next_number(pos) {
            count += 1;
            pos = self.number_end(start);
        }
        count
    }

    fn line(&mut self, text: &mut String) -> bool {
        if self.pos >= self.text.len() {
            return false;
        }
        let rest = &self.text[self.pos..];
        let len = rest.find('\n').map_or(rest.len(), |i| i + 1);
        *text = trim_ascii(&rest[..len]).to_owned();
        self.pos += len;
        true
    }
}

/// An audio file read through a codec.
pub struct AudioFile {
    reader: Box<dyn AudioReader>,
}

impl std::fmt::Debug for AudioFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFile").field("info", &self.reader.info()).finish()
    }
}

/// One entry of the handle table.
#[derive(Debug)]
pub enum OpenFile {
    /// State serializer, always slot 0.
    Serializer(Serializer),
    /// Raw `f32` data.
    Raw(RawFile),
    /// Text numbers and lines.
    Text(TextFile),
    /// Audio samples.
    Audio(AudioFile),
}

impl OpenFile {
    /// Open `path` as the given type.
    pub fn open(path: &Path, file_type: &FileType) -> Option<Self> {
        match file_type {
            FileType::None => None,
            FileType::Raw => std::fs::read(path)
                .ok()
                .map(|data| OpenFile::Raw(RawFile { data, pos: 0 })),
            FileType::Text => std::fs::read(path).ok().map(|bytes| {
                OpenFile::Text(TextFile {
                    text: String::from_utf8_lossy(&bytes).into_owned(),
                    pos: 0,
                })
            }),
            FileType::Audio(format) => format.open(path).map(|reader| OpenFile::Audio(AudioFile { reader })),
        }
    }

    /// Values left to read, `-1` for a serializer in write mode.
    pub fn avail(&self) -> i64 {
        match self {
            OpenFile::Serializer(s) => s.avail(),
            OpenFile::Raw(f) => ((f.data.len() - f.pos) / 4) as i64,
            OpenFile::Text(f) => f.avail(),
            OpenFile::Audio(f) => i64::try_from(f.reader.avail()).unwrap_or(i64::MAX),
        }
    }

    /// Seek to the start.
    pub fn rewind(&mut self) -> bool {
        match self {
            OpenFile::Serializer(s) => s.pos = 0,
            OpenFile::Raw(f) => f.pos = 0,
            OpenFile::Text(f) => f.pos = 0,
            OpenFile::Audio(f) => f.reader.rewind(),
        }
        true
    }

    /// Read one value, or write it for a serializer in write mode.
    pub fn var(&mut self, value: &mut f64) -> bool {
        match self {
            OpenFile::Serializer(s) => s.var(value),
            OpenFile::Raw(f) => f.read(value),
            OpenFile::Text(f) => f.read(value),
            OpenFile::Audio(f) => {
                let mut sample = [0.0];
                let got = f.reader.read(&mut sample) == 1;
                if got {
                    *value = sample[0];
                }
                got
            }
        }
    }

    /// Move a block of values. Returns how many were moved.
    pub fn mem(&mut self, buf: &mut [f64]) -> u32 {
        if let OpenFile::Audio(f) = self {
            return f.reader.read(buf) as u32;
        }
        let mut count = 0;
        for slot in buf.iter_mut() {
            if !self.var(slot) {
                break;
            }
            count += 1;
        }
        count
    }

    /// Read a string (text line or serialized string), or write one.
    pub fn string(&mut self, text: &mut String) -> bool {
        match self {
            OpenFile::Serializer(s) => s.string(text),
            OpenFile::Text(f) => f.line(text),
            OpenFile::Raw(_) | OpenFile::Audio(_) => false,
        }
    }

    /// Audio format, for audio files only.
    pub fn riff(&self) -> Option<RiffInfo> {
        match self {
            OpenFile::Audio(f) => {
                let info = f.reader.info();
                Some(RiffInfo {
                    channels: info.channels,
                    sample_rate: info.sample_rate,
                })
            }
            _ => None,
        }
    }

    /// Whether this is a text file.
    pub fn is_text(&self) -> bool {
        matches!(self, OpenFile::Text(_))
    }
}

/// Shared reference to one open handle.
pub type FileRef = Arc<Mutex<OpenFile>>;

/// The handle table of one effect instance.
#[derive(Debug)]
pub struct FileTable {
    serializer: FileRef,
    list: Mutex<Vec<Option<FileRef>>>,
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTable {
    /// Create a table holding only the serializer.
    pub fn new() -> Self {
        let serializer = Arc::new(Mutex::new(OpenFile::Serializer(Serializer::default())));
        let mut list = Vec::with_capacity(16);
        list.push(Some(Arc::clone(&serializer)));
        Self {
            serializer,
            list: Mutex::new(list),
        }
    }

    /// Run `f` on the serializer under its lock.
    pub fn with_serializer<R>(&self, f: impl FnOnce(&mut Serializer) -> R) -> Option<R> {
        match &mut *self.serializer.lock() {
            OpenFile::Serializer(s) => Some(f(s)),
            _ => None,
        }
    }

    /// Resolve a handle. The list lock is released on return.
    pub fn get(&self, handle: u32) -> Option<FileRef> {
        self.list.lock().get(handle as usize)?.clone()
    }

    /// Insert an open file, reusing the lowest free slot.
    pub fn insert(&self, file: OpenFile) -> u32 {
        let entry = Some(Arc::new(Mutex::new(file)));
        let mut list = self.list.lock();
        let index = match list.iter().skip(1).position(Option::is_none) {
            Some(free) => {
                list[free + 1] = entry;
                free + 1
            }
            None => {
                list.push(entry);
                list.len() - 1
            }
        };
        index as u32
    }

    /// Detect, open and insert `path`.
    pub fn open(&self, config: &Config, path: &Path) -> Option<u32> {
        let file_type = detect_file_type(config, path);
        let file = OpenFile::open(path, &file_type)?;
        let handle = self.insert(file);
        tracing::debug!("opened {} as handle {handle}", path.display());
        Some(handle)
    }

    /// Close a handle. The serializer cannot be closed.
    pub fn close(&self, handle: u32) -> bool {
        if handle == SERIALIZER_HANDLE {
            return false;
        }
        let mut list = self.list.lock();
        match list.get_mut(handle as usize) {
            Some(slot @ Some(_)) => {
                *slot = None;
                while list.len() > 1 && list.last().is_some_and(Option::is_none) {
                    list.pop();
                }
                true
            }
            _ => false,
        }
    }

    /// Drop every handle except the serializer.
    pub fn clear(&self) {
        self.list.lock().truncate(1);
    }

    /// Number of open handles, the serializer included.
    pub fn open_count(&self) -> usize {
        self.list.lock().iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_file(text: &str) -> OpenFile {
        OpenFile::Text(TextFile {
            text: text.to_owned(),
            pos: 0,
        })
    }

    #[test]
    fn serializer_write_then_read() {
        let mut s = Serializer::default();
        s.begin(SerialMode::Write, Vec::new());
        assert_eq!(s.avail(), -1);
        let mut a = 1.5;
        let mut name = String::from("preset");
        assert!(s.var(&mut a));
        assert!(s.string(&mut name));
        let data = s.end();
        assert_eq!(data.len(), 4 + 4 + 6);
        assert_eq!(s.mode(), None);

        s.begin(SerialMode::Read, data);
        assert_eq!(s.avail(), 3);
        let mut b = 0.0;
        let mut got = String::new();
        assert!(s.var(&mut b));
        assert!(s.string(&mut got));
        assert_eq!(b, 1.5);
        assert_eq!(got, "preset");
        assert!(!s.var(&mut b));
        assert_eq!(b, 1.5);
    }

    #[test]
    fn idle_serializer_refuses_io() {
        let mut s = Serializer::default();
        let mut v = 3.0;
        assert!(!s.var(&mut v));
        assert_eq!(s.avail(), 0);
    }

    #[test]
    fn text_numbers_and_lines() {
        let mut f = text_file("1, 2.5 -3\n// 99 ignored\n4e1\n");
        assert_eq!(f.avail(), 4);
        let mut buf = [0.0; 8];
        assert_eq!(f.mem(&mut buf), 4);
        assert_eq!(&buf[..4], &[1.0, 2.5, -3.0, 40.0]);
        assert_eq!(f.avail(), 0);

        f.rewind();
        let mut line = String::new();
        assert!(f.string(&mut line));
        assert_eq!(line, "1, 2.5 -3");
        assert!(f.is_text());
        assert!(f.riff().is_none());
    }

    #[test]
    fn text_skips_stray_punctuation() {
        let mut f = text_file("- . + , .5 -.25 +7 1e-1\n");
        assert_eq!(f.avail(), 4);
        let mut buf = [0.0; 8];
        assert_eq!(f.mem(&mut buf), 4);
        assert_eq!(&buf[..4], &[0.5, -0.25, 7.0, 0.1]);
    }

    struct SilentReader;

    impl AudioReader for SilentReader {
        fn info(&self) -> jsfx_core::AudioFileInfo {
            jsfx_core::AudioFileInfo {
                channels: 2,
                sample_rate: 44100.0,
            }
        }

        fn avail(&self) -> u64 {
            0
        }

        fn rewind(&mut self) {}

        fn read(&mut self, _dest: &mut [f64]) -> u64 {
            0
        }
    }

    #[test]
    fn audio_riff_reports_format() {
        let f = OpenFile::Audio(AudioFile {
            reader: Box::new(SilentReader),
        });
        assert_eq!(
            f.riff(),
            Some(RiffInfo {
                channels: 2,
                sample_rate: 44100.0,
            })
        );
        assert!(!f.is_text());
    }

    #[test]
    fn raw_values() {
        let mut data = Vec::new();
        for v in [0.25f32, -1.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.push(0xff);
        let mut f = OpenFile::Raw(RawFile { data, pos: 0 });
        assert_eq!(f.avail(), 2);
        let mut v = 0.0;
        assert!(f.var(&mut v));
        assert_eq!(v, 0.25);
        assert!(f.var(&mut v));
        assert_eq!(v, -1.0);
        assert!(!f.var(&mut v));
        let mut s = String::new();
        assert!(!f.string(&mut s));
    }

    #[test]
    fn table_reuses_tombstones() {
        let table = FileTable::new();
        assert_eq!(table.open_count(), 1);
        let a = table.insert(text_file("1"));
        let b = table.insert(text_file("2"));
        let c = table.insert(text_file("3"));
        assert_eq!((a, b, c), (1, 2, 3));

        assert!(table.close(b));
        assert!(!table.close(b));
        assert!(table.get(b).is_none());
        assert!(table.get(c).is_some());
        assert_eq!(table.insert(text_file("4")), 2);

        assert!(!table.close(SERIALIZER_HANDLE));
        table.clear();
        assert_eq!(table.open_count(), 1);
        assert!(table.get(SERIALIZER_HANDLE).is_some());
    }

    #[test]
    fn closing_last_handle_trims_the_tail() {
        let table = FileTable::new();
        let a = table.insert(text_file("1"));
        assert!(table.close(a));
        assert_eq!(table.insert(text_file("2")), 1);
    }

    #[test]
    fn serializer_slot_is_shared() {
        let table = FileTable::new();
        table.with_serializer(|s| s.begin(SerialMode::Write, Vec::new()));
        let slot = table.get(SERIALIZER_HANDLE).unwrap();
        let mut v = 2.0;
        assert!(slot.lock().var(&mut v));
        let data = table.with_serializer(Serializer::end).unwrap();
        assert_eq!(data, 2.0f32.to_le_bytes());
    }
}
