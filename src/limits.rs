/// Resource limits for decode/encode operations.
///
/// All fields default to `None` (no limit). Width, height, and pixel limits
/// are checked once per directory before the destination layer is allocated;
/// the directory limit bounds how far a chained container is walked.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height) per directory.
    pub max_pixels: Option<u64>,
    /// Maximum memory bytes for one layer allocation.
    pub max_memory_bytes: Option<u64>,
    /// Maximum number of directories decoded from one container.
    pub max_directories: Option<u64>,
}

impl Limits {
    /// Check dimensions against limits. Returns Ok(()) or LimitExceeded error.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), crate::TiffError> {
        if let Some(max_w) = self.max_width {
            if u64::from(width) > max_w {
                return Err(crate::TiffError::LimitExceeded(alloc::format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(height) > max_h {
                return Err(crate::TiffError::LimitExceeded(alloc::format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(crate::TiffError::LimitExceeded(alloc::format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Check that an allocation size is within memory limits.
    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), crate::TiffError> {
        if let Some(max_mem) = self.max_memory_bytes {
            if bytes as u64 > max_mem {
                return Err(crate::TiffError::LimitExceeded(alloc::format!(
                    "allocation {bytes} bytes exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(())
    }

    /// Check the running directory count against the directory limit.
    pub(crate) fn check_directories(&self, count: u64) -> Result<(), crate::TiffError> {
        if let Some(max_dirs) = self.max_directories {
            if count > max_dirs {
                return Err(crate::TiffError::LimitExceeded(alloc::format!(
                    "directory count {count} exceeds limit {max_dirs}"
                )));
            }
        }
        Ok(())
    }
}
