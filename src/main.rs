#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]

#[cfg(not(test))]
mod kernel {
    use bootloader::{entry_point, BootInfo};
    use core::panic::PanicInfo;
    use log::LevelFilter;
    use vgafill::memory::KernelBase;
    use vgafill::FillConfig;

    entry_point!(kernel_main);

    fn kernel_main(boot_info: &'static BootInfo) -> ! {
        // Logging is best-effort; the screen gets filled either way
        let _ = vgafill::serial::init_logging(LevelFilter::Info);
        log::info!("vgafill {}", env!("CARGO_PKG_VERSION"));

        let base = KernelBase::new(boot_info.physical_memory_offset);
        vgafill::run(base, &FillConfig::DEFAULT)
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        log::error!("{}", info);
        vgafill::abort(format_args!("KERNEL PANIC: {}", info))
    }
}
