use std::fmt;

use thiserror::Error;

/// Errors detected while constructing a [`Geometry`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("page size {0} is not a power of two")]
    PageSizeNotPowerOfTwo(u64),
    #[error("address width {0} exceeds 64 bits")]
    WidthTooLarge(u32),
    #[error("offset needs {offset_bits} bits but virtual addresses only have {va_bits}")]
    OffsetWiderThanAddress { offset_bits: u32, va_bits: u32 },
}

/// Address widths and page size for one address space, fixed for a session.
///
/// The offset width is derived from the page size at construction, so a page
/// size that is not a power of two is rejected here rather than producing a
/// fractional split downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    va_bits: u32,
    pa_bits: u32,
    page_size: u64,
    offset_bits: u32,
}

impl Geometry {
    pub fn new(va_bits: u32, pa_bits: u32, page_size: u64) -> Result<Self, GeometryError> {
        if va_bits > 64 {
            return Err(GeometryError::WidthTooLarge(va_bits));
        }
        if pa_bits > 64 {
            return Err(GeometryError::WidthTooLarge(pa_bits));
        }
        if !page_size.is_power_of_two() {
            return Err(GeometryError::PageSizeNotPowerOfTwo(page_size));
        }

        let offset_bits = page_size.trailing_zeros();
        if offset_bits > va_bits {
            return Err(GeometryError::OffsetWiderThanAddress { offset_bits, va_bits });
        }

        Ok(Geometry {
            va_bits,
            pa_bits,
            page_size,
            offset_bits,
        })
    }

    #[inline]
    pub fn va_bits(&self) -> u32 {
        self.va_bits
    }

    #[inline]
    pub fn pa_bits(&self) -> u32 {
        self.pa_bits
    }

    #[inline]
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    #[inline]
    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    /// Mask covering the offset portion of an address.
    #[inline]
    pub fn offset_mask(&self) -> u64 {
        (1u64 << self.offset_bits) - 1
    }

    /// Combine a frame number and an in-page offset into a physical address.
    #[inline]
    pub fn join(&self, frame: u64, offset: u64) -> u64 {
        (frame << self.offset_bits) | offset
    }
}

/// A virtual address decomposed against a [`Geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub raw: u64,
    pub page: u64,
    pub offset: u64,
}

impl VirtualAddress {
    /// Split a raw address into page number and offset. Defined for every
    /// `u64`; addresses past the end of the table are the translator's
    /// problem, not the decoder's.
    pub fn decode(raw: u64, geometry: &Geometry) -> Self {
        let page = raw >> geometry.offset_bits();
        let offset = raw & geometry.offset_mask();

        VirtualAddress { raw, page, offset }
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VA({}) = (page={}, offset={})",
            self.raw, self.page, self.offset
        )
    }
}
