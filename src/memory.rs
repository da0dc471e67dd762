//! Where physical memory is visible to the kernel.
//!
//! The bootloader maps all of physical memory at a fixed virtual offset; any
//! physical address, the VGA text buffer included, is reached through it.

use core::sync::atomic::{AtomicU64, Ordering};
use x86_64::VirtAddr;

/// Physical address of the VGA text buffer
pub const VGA_TEXT_PHYS: u64 = 0xb8000;

/// Virtual offset of the physical memory mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelBase(u64);

impl KernelBase {
    /// Physical memory identity mapped
    pub const IDENTITY: KernelBase = KernelBase(0);

    /// Physical memory mapped into the top gigabyte
    pub const HIGHER_HALF: KernelBase = KernelBase(0u64.wrapping_sub(1 << 30));

    pub const fn new(offset: u64) -> KernelBase {
        KernelBase(offset)
    }

    pub const fn offset(self) -> u64 {
        self.0
    }

    pub fn phys_to_virt(self, phys: u64) -> VirtAddr {
        VirtAddr::new_truncate(self.0.wrapping_add(phys))
    }

    pub fn vga_text_buffer(self) -> VirtAddr {
        self.phys_to_virt(VGA_TEXT_PHYS)
    }
}

impl Default for KernelBase {
    fn default() -> Self {
        KernelBase::IDENTITY
    }
}

static KERNEL_BASE: AtomicU64 = AtomicU64::new(0);

/// Record the offset handed over by the bootloader.
pub fn init(base: KernelBase) {
    KERNEL_BASE.store(base.offset(), Ordering::Relaxed);
}

/// The recorded offset, identity until [`init`] runs.
pub fn kernel_base() -> KernelBase {
    KernelBase(KERNEL_BASE.load(Ordering::Relaxed))
}
