#![cfg(feature = "usb")]

//! List the attached readers, open the first one and poll for a tag.
//!
//! Usage:
//!   cargo run -p libnfc --example nfc_poll --features usb

use libnfc::{BaudRate, Device, Modulation, ModulationType, Result, Target};

fn main() -> Result<()> {
    // LIBNFC_LOG_LEVEL: 0 none .. 3 trace
    let level = match std::env::var("LIBNFC_LOG_LEVEL").ok().as_deref() {
        Some("0") => log::LevelFilter::Off,
        Some("1") => log::LevelFilter::Warn,
        Some("2") => log::LevelFilter::Debug,
        Some("3") => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };
    env_logger::Builder::new().filter_level(level).init();

    for connstring in Device::list_devices(8) {
        println!("found device: {}", connstring);
    }

    let mut device = Device::open(None)?;
    println!("opened {} on {}", device.name(), device.connstring());

    device.initiator_init()?;

    let modulations = [
        Modulation::new(ModulationType::Iso14443a, BaudRate::B106),
        Modulation::new(ModulationType::Felica, BaudRate::B212),
        Modulation::new(ModulationType::Iso14443b, BaudRate::B106),
    ];
    match device.poll_target(&modulations, 20, 2)? {
        Some((modulation, Target::Iso14443a(tag))) => {
            println!(
                "ISO14443-A tag at {} kbps: ATQA {:02x}{:02x} SAK {:02x} UID {}",
                modulation.baud_rate.kbps(),
                tag.atqa[0],
                tag.atqa[1],
                tag.sak,
                libnfc::utils::bytes_to_hex(&tag.uid),
            );
        }
        Some((modulation, target)) => {
            println!("target at {} kbps: {:?}", modulation.baud_rate.kbps(), target);
        }
        None => println!("no target found"),
    }

    device.close()
}
