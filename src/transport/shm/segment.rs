use super::layout::*;
use crate::transport::TransportError;
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use std::{hint, io, thread};

const SPIN_LIMIT: u32 = 64;
const YIELD_LIMIT: u32 = 256;
const SLEEP: Duration = Duration::from_micros(50);

/// A mapped segment. Header words are only touched through `AtomicU32`;
/// payload areas are copied in and out while the flag protocol grants this
/// side ownership of them.
pub(super) struct Segment {
    ptr: NonNull<u8>,
    layout: Layout,
    path: PathBuf,
}

// The mapping is process-wide and the pointer is never aliased by a Rust
// reference outside the atomic header words.
unsafe impl Send for Segment {}

impl Segment {
    /// Truncates `path`, sizes it for `layout` and writes a fresh header.
    /// The magic word is published last.
    pub fn create(path: &Path, layout: Layout) -> Result<Self, TransportError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(layout.total_len() as u64)?;

        let segment = Self::map(&file, path, layout)?;
        segment.store(OFF_VERSION, VERSION);
        segment.store(OFF_FEATURES, layout.feature_count() as u32);
        segment.store(OFF_CLASSES, layout.class_count() as u32);
        segment.store(OFF_MAX_ROWS, layout.max_rows() as u32);
        segment.store(OFF_REQUEST, 0);
        segment.store(OFF_RESPONSE, 0);
        segment.word(OFF_MAGIC).store(MAGIC, Ordering::Release);
        Ok(segment)
    }

    /// Maps a segment somebody else initialised, trusting its header.
    pub fn attach(path: &Path) -> Result<Self, TransportError> {
        Self::attach_within(path, Duration::ZERO)
    }

    /// Like `attach`, but waits up to `patience` for the owner to publish the
    /// header of a segment it is still initialising.
    pub fn attach_within(path: &Path, patience: Duration) -> Result<Self, TransportError> {
        let started = Instant::now();
        let mut backoff = Backoff::default();
        loop {
            let mut file = OpenOptions::new().read(true).write(true).open(path)?;
            match published_header(&mut file)? {
                Some(header) => return Self::attach_header(file, path, &header),
                None if started.elapsed() >= patience => {
                    return Err(TransportError::BadSegment(format!(
                        "{} has no published header",
                        path.display()
                    )));
                }
                None => backoff.snooze(),
            }
        }
    }

    fn attach_header(
        file: File,
        path: &Path,
        header: &[u8; HEADER_LEN],
    ) -> Result<Self, TransportError> {
        let magic = header_word(header, OFF_MAGIC);
        if magic != MAGIC {
            return Err(TransportError::BadSegment(format!(
                "bad magic {magic:#010x} in {}",
                path.display()
            )));
        }
        let version = header_word(header, OFF_VERSION);
        if version != VERSION {
            return Err(TransportError::BadSegment(format!(
                "unsupported layout version {version}"
            )));
        }

        let layout = Layout::new(
            header_word(header, OFF_FEATURES) as usize,
            header_word(header, OFF_CLASSES) as usize,
            header_word(header, OFF_MAX_ROWS) as usize,
        )?;
        let actual = file.metadata()?.len();
        if actual < layout.total_len() as u64 {
            return Err(TransportError::BadSegment(format!(
                "{} holds {actual} bytes, layout needs {}",
                path.display(),
                layout.total_len()
            )));
        }
        Self::map(&file, path, layout)
    }

    fn map(file: &File, path: &Path, layout: Layout) -> Result<Self, TransportError> {
        // SAFETY: fresh shared mapping of a file we hold open; the length was
        // checked against the file size by both constructors.
        let raw = unsafe {
            libc::mmap(
                ptr::null_mut(),
                layout.total_len(),
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if raw == libc::MAP_FAILED {
            return Err(io::Error::last_os_error().into());
        }
        let ptr = NonNull::new(raw.cast::<u8>())
            .ok_or_else(|| TransportError::BadSegment("mmap returned null".into()))?;

        Ok(Self {
            ptr,
            layout,
            path: path.to_path_buf(),
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn word(&self, offset: usize) -> &AtomicU32 {
        debug_assert!(offset % 4 == 0 && offset + 4 <= HEADER_LEN);
        // SAFETY: header words are 4-byte aligned inside a page-aligned mapping
        // that lives as long as `self`.
        unsafe { &*self.ptr.as_ptr().add(offset).cast::<AtomicU32>() }
    }

    pub fn load(&self, offset: usize) -> u32 {
        self.word(offset).load(Ordering::Relaxed)
    }

    pub fn store(&self, offset: usize, value: u32) {
        self.word(offset).store(value, Ordering::Relaxed);
    }

    /// Publishes everything written so far to the side waiting on `flag`.
    pub fn raise(&self, flag: usize) {
        self.word(flag).store(1, Ordering::Release);
    }

    pub fn lower(&self, flag: usize) {
        self.word(flag).store(0, Ordering::Release);
    }

    pub fn is_raised(&self, flag: usize) -> bool {
        self.word(flag).load(Ordering::Acquire) == 1
    }

    /// Blocks until `flag` is raised: spins briefly, then yields, then sleeps.
    pub fn wait_raised(&self, flag: usize) {
        let mut backoff = Backoff::default();
        while !self.is_raised(flag) {
            backoff.snooze();
        }
    }

    fn check_range(&self, offset: usize, bytes: usize) {
        debug_assert!(
            offset + bytes <= self.layout.total_len(),
            "access past segment end"
        );
    }

    pub fn read_f64s(&self, offset: usize, n: usize) -> Vec<f64> {
        self.check_range(offset, n * 8);
        let mut out = vec![0.0; n];
        // SAFETY: range lies inside the mapping and is 8-byte aligned.
        unsafe {
            ptr::copy_nonoverlapping(
                self.ptr.as_ptr().add(offset).cast::<f64>(),
                out.as_mut_ptr(),
                n,
            );
        }
        out
    }

    pub fn write_f64s(&self, offset: usize, values: &[f64]) {
        self.check_range(offset, values.len() * 8);
        // SAFETY: as in `read_f64s`.
        unsafe {
            ptr::copy_nonoverlapping(
                values.as_ptr(),
                self.ptr.as_ptr().add(offset).cast::<f64>(),
                values.len(),
            );
        }
    }

    pub fn read_bytes(&self, offset: usize, n: usize) -> Vec<u8> {
        self.check_range(offset, n);
        let mut out = vec![0u8; n];
        // SAFETY: range lies inside the mapping.
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr().add(offset), out.as_mut_ptr(), n);
        }
        out
    }

    pub fn write_bytes(&self, offset: usize, bytes: &[u8]) {
        self.check_range(offset, bytes.len());
        // SAFETY: range lies inside the mapping.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.ptr.as_ptr().add(offset), bytes.len());
        }
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        // SAFETY: unmaps exactly the region mapped in `map`.
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast(), self.layout.total_len());
        }
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("path", &self.path)
            .field("layout", &self.layout)
            .finish()
    }
}

#[derive(Default)]
struct Backoff {
    rounds: u32,
}

impl Backoff {
    fn snooze(&mut self) {
        if self.rounds < SPIN_LIMIT {
            hint::spin_loop();
        } else if self.rounds < YIELD_LIMIT {
            thread::yield_now();
        } else {
            thread::sleep(SLEEP);
        }
        self.rounds = self.rounds.saturating_add(1);
    }
}

/// The header of `file`, or `None` while it is too short or its magic word
/// is still zero.
fn published_header(file: &mut File) -> Result<Option<[u8; HEADER_LEN]>, TransportError> {
    let mut header = [0u8; HEADER_LEN];
    match file.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    Ok((header_word(&header, OFF_MAGIC) != 0).then_some(header))
}

fn header_word(header: &[u8; HEADER_LEN], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&header[offset..offset + 4]);
    u32::from_ne_bytes(bytes)
}
