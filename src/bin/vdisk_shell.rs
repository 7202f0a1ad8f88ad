use std::fs::File;
use std::io::prelude::*;

use libchardev::{CharDevice, CharDeviceError, CharDeviceResult, OpenFile};
use virtual_disk::{
    dispatch, MemoryRegistry, ModuleConfig, Request, VirtualDiskModule, CAPACITY, MEM_CLEAR,
};

#[macro_use]
extern crate log;

extern crate env_logger;

/// Amount of bytes printed per hexdump line.
const LINE_LEN: usize = 16;

fn print_device<'a>(file: &mut Box<dyn OpenFile + 'a>) -> CharDeviceResult<()> {
    let mut buffer = [0u8; CAPACITY];

    let position = dispatch(file.as_mut(), Request::Llseek(0, 0));
    if position < 0 {
        return Err(CharDeviceError::InvalidArgument);
    }

    let read_size = file.read(&mut buffer)?;
    for (index, line) in buffer[..read_size].chunks(LINE_LEN).enumerate() {
        print!("{:04x}:", index * LINE_LEN);
        for byte in line {
            print!(" {:02x}", byte);
        }
        println!();
    }

    Ok(())
}

fn load_from_file<'a>(file: &mut Box<dyn OpenFile + 'a>, path: &str) -> CharDeviceResult<()> {
    let mut f = File::open(path).map_err(|err| {
        error!("cannot open {}: {}", path, err);
        CharDeviceError::Custom {
            name: "cannot open image",
        }
    })?;

    let mut base_buffer = Vec::new();
    f.read_to_end(&mut base_buffer).map_err(|err| {
        error!("cannot read {}: {}", path, err);
        CharDeviceError::Custom {
            name: "cannot read image",
        }
    })?;

    // The device always consumes a full image.
    base_buffer.resize(CAPACITY, 0u8);

    let written = file.write(&base_buffer)?;
    info!("loaded {} byte(s) from {}", written, path);

    Ok(())
}

fn main() -> CharDeviceResult<()> {
    env_logger::init();

    let registry = MemoryRegistry::new();
    let module = VirtualDiskModule::init(ModuleConfig::default(), &registry)?;

    let devno = module.device_number();
    info!(
        "{} loaded as {}:{}",
        module.config().node_name,
        devno.major,
        devno.minor
    );

    let mut args = std::env::args().skip(1);
    {
        let mut file = CharDevice::open(module.device())?;

        match args.next().as_deref() {
            Some("--clear") => file.ioctl(MEM_CLEAR, 0)?,
            Some(path) => load_from_file(&mut file, path)?,
            None => {}
        }

        print_device(&mut file)?;
    }

    module.exit(&registry);
    Ok(())
}
