//! Loading and unloading of the virtual disk by a host.

use libchardev::{CharDeviceError, CharDeviceResult, DeviceNumber};

use crate::device::Device;
use crate::error::DeviceResult;
use crate::registry::DeviceRegistry;

/// Registration parameters of the virtual disk.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    /// Requested major, ``0`` to let the host pick one.
    pub major: u32,

    /// Name of the driver owning the device numbers.
    pub device_name: &'static str,

    /// Name of the class the node is published under.
    pub class_name: &'static str,

    /// Name of the published node.
    pub node_name: &'static str,
}

impl ModuleConfig {
    pub const DEFAULT_MAJOR: u32 = 200;
    pub const DEVICE_NAME: &'static str = "VirtualDisk1";
    pub const CLASS_NAME: &'static str = "virtual_disk";
    pub const NODE_NAME: &'static str = "VirtualDisk";
}

impl Default for ModuleConfig {
    fn default() -> Self {
        ModuleConfig {
            major: Self::DEFAULT_MAJOR,
            device_name: Self::DEVICE_NAME,
            class_name: Self::CLASS_NAME,
            node_name: Self::NODE_NAME,
        }
    }
}

/// A loaded virtual disk: its device numbers and the device itself.
pub struct VirtualDiskModule {
    config: ModuleConfig,
    devno: DeviceNumber,
    device: Device,
    class_created: bool,
    node_created: bool,
}

impl VirtualDiskModule {
    /// Register the device numbers, create the device and publish its node.
    pub fn init<R: DeviceRegistry>(config: ModuleConfig, registry: &R) -> CharDeviceResult<Self> {
        Self::init_with(config, registry, Device::new)
    }

    pub(crate) fn init_with<R, F>(
        config: ModuleConfig,
        registry: &R,
        create_device: F,
    ) -> CharDeviceResult<Self>
    where
        R: DeviceRegistry,
        F: FnOnce() -> DeviceResult<Device>,
    {
        trace!("init: enter");

        let registration = if config.major != 0 {
            let devno = DeviceNumber::new(config.major, 0);
            registry
                .register_region(devno, 1, config.device_name)
                .map(|_| devno)
        } else {
            registry.alloc_region(0, 1, config.device_name)
        };

        let devno = registration.map_err(|err| {
            error!("init: cannot register {}: {}", config.device_name, err);
            err
        })?;
        debug!(
            "init: {} registered as {}:{} (devno 0x{:x})",
            config.device_name,
            devno.major,
            devno.minor,
            devno.into_raw()
        );

        let device = match create_device() {
            Ok(device) => device,
            Err(err) => {
                error!("init: cannot create the device: {}", err);
                registry.unregister_region(devno, 1);
                return Err(CharDeviceError::from(err));
            }
        };

        let mut module = VirtualDiskModule {
            config,
            devno,
            device,
            class_created: false,
            node_created: false,
        };
        module.publish(registry);

        Ok(module)
    }

    /// Create the class and the node. Failures leave the device loaded but unpublished.
    fn publish<R: DeviceRegistry>(&mut self, registry: &R) {
        if let Err(err) = registry.create_class(self.config.class_name) {
            error!("init: cannot create class {}: {}", self.config.class_name, err);
            return;
        }
        self.class_created = true;

        match registry.create_node(self.config.class_name, self.devno, self.config.node_name) {
            Ok(()) => self.node_created = true,
            Err(err) => error!("init: cannot create node {}: {}", self.config.node_name, err),
        }
    }

    /// Remove the node and the class, give back the device numbers and destroy the device.
    pub fn exit<R: DeviceRegistry>(self, registry: &R) {
        trace!("exit: enter");

        if self.node_created {
            registry.destroy_node(self.config.class_name, self.devno);
        }

        if self.class_created {
            registry.destroy_class(self.config.class_name);
        }

        registry.unregister_region(self.devno, 1);
        self.device.destroy();
    }

    /// Return the device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Return the device number the device is registered under.
    pub fn device_number(&self) -> DeviceNumber {
        self.devno
    }

    /// Return the configuration used to load the module.
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Return true if the node is visible to the host.
    pub fn is_published(&self) -> bool {
        self.node_created
    }
}
