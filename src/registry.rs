//! Host side bookkeeping of device numbers, classes and nodes.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use libchardev::{CharDeviceError, CharDeviceResult, DeviceNumber};
use spin::Mutex;

/// The services a host offers to register a character device.
pub trait DeviceRegistry {
    /// Reserve ``count`` minors starting at ``first`` for the driver ``name``.
    fn register_region(&self, first: DeviceNumber, count: u32, name: &str) -> CharDeviceResult<()>;

    /// Reserve ``count`` minors starting at ``first_minor`` under a free major.
    fn alloc_region(&self, first_minor: u32, count: u32, name: &str)
        -> CharDeviceResult<DeviceNumber>;

    /// Give back a region obtained from ``register_region`` or ``alloc_region``.
    fn unregister_region(&self, first: DeviceNumber, count: u32);

    /// Create a device class.
    fn create_class(&self, name: &str) -> CharDeviceResult<()>;

    /// Destroy a device class.
    fn destroy_class(&self, name: &str);

    /// Publish a node named ``node_name`` for ``devno`` under ``class``.
    fn create_node(&self, class: &str, devno: DeviceNumber, node_name: &str)
        -> CharDeviceResult<()>;

    /// Remove the node of ``devno`` from ``class``.
    fn destroy_node(&self, class: &str, devno: DeviceNumber);
}

/// A region of device numbers owned by a driver.
#[derive(Debug, Clone)]
struct Region {
    first_minor: u32,
    count: u32,
    name: String,
}

#[derive(Default)]
struct RegistryState {
    /// Regions indexed by major.
    regions: BTreeMap<u32, Region>,

    /// Nodes of every class.
    classes: BTreeMap<String, BTreeMap<DeviceNumber, String>>,
}

/// A registry living in memory.
pub struct MemoryRegistry {
    state: Mutex<RegistryState>,
}

impl MemoryRegistry {
    /// Highest major handed out by dynamic allocation.
    pub const DYNAMIC_MAJOR_START: u32 = 254;

    /// Lowest major handed out by dynamic allocation.
    pub const DYNAMIC_MAJOR_END: u32 = 234;

    pub fn new() -> Self {
        MemoryRegistry {
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Return the name of the driver owning ``major``.
    pub fn region_owner(&self, major: u32) -> Option<String> {
        self.state
            .lock()
            .regions
            .get(&major)
            .map(|region| region.name.clone())
    }

    /// Return true if the class exists.
    pub fn has_class(&self, class: &str) -> bool {
        self.state.lock().classes.contains_key(class)
    }

    /// Return the name of the node published for ``devno`` under ``class``.
    pub fn node_name(&self, class: &str, devno: DeviceNumber) -> Option<String> {
        self.state
            .lock()
            .classes
            .get(class)
            .and_then(|nodes| nodes.get(&devno))
            .cloned()
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        MemoryRegistry::new()
    }
}

impl DeviceRegistry for MemoryRegistry {
    fn register_region(&self, first: DeviceNumber, count: u32, name: &str) -> CharDeviceResult<()> {
        let mut state = self.state.lock();

        if let Some(region) = state.regions.get(&first.major) {
            warn!(
                "major {} already registered by {} ({} minor(s) from {})",
                first.major, region.name, region.count, region.first_minor
            );
            return Err(CharDeviceError::Busy);
        }

        state.regions.insert(
            first.major,
            Region {
                first_minor: first.minor,
                count,
                name: name.to_string(),
            },
        );

        Ok(())
    }

    fn alloc_region(
        &self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> CharDeviceResult<DeviceNumber> {
        let mut state = self.state.lock();

        let major = (Self::DYNAMIC_MAJOR_END..=Self::DYNAMIC_MAJOR_START)
            .rev()
            .find(|major| !state.regions.contains_key(major))
            .ok_or(CharDeviceError::Busy)?;

        state.regions.insert(
            major,
            Region {
                first_minor,
                count,
                name: name.to_string(),
            },
        );

        Ok(DeviceNumber::new(major, first_minor))
    }

    fn unregister_region(&self, first: DeviceNumber, _count: u32) {
        self.state.lock().regions.remove(&first.major);
    }

    fn create_class(&self, name: &str) -> CharDeviceResult<()> {
        let mut state = self.state.lock();

        if state.classes.contains_key(name) {
            return Err(CharDeviceError::Busy);
        }

        state.classes.insert(name.to_string(), BTreeMap::new());
        Ok(())
    }

    fn destroy_class(&self, name: &str) {
        self.state.lock().classes.remove(name);
    }

    fn create_node(
        &self,
        class: &str,
        devno: DeviceNumber,
        node_name: &str,
    ) -> CharDeviceResult<()> {
        let mut state = self.state.lock();

        let nodes = state
            .classes
            .get_mut(class)
            .ok_or(CharDeviceError::Custom {
                name: "unknown device class",
            })?;

        if nodes.contains_key(&devno) || nodes.values().any(|name| name == node_name) {
            return Err(CharDeviceError::Busy);
        }

        nodes.insert(devno, node_name.to_string());
        Ok(())
    }

    fn destroy_node(&self, class: &str, devno: DeviceNumber) {
        if let Some(nodes) = self.state.lock().classes.get_mut(class) {
            nodes.remove(&devno);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_region_conflicts_are_busy() {
        let registry = MemoryRegistry::new();
        let devno = DeviceNumber::new(200, 0);

        registry.register_region(devno, 1, "first").unwrap();
        assert_eq!(
            registry.register_region(devno, 1, "second"),
            Err(CharDeviceError::Busy)
        );
        assert_eq!(registry.region_owner(200).as_deref(), Some("first"));

        registry.unregister_region(devno, 1);
        assert_eq!(registry.region_owner(200), None);
        registry.register_region(devno, 1, "second").unwrap();
    }

    #[test]
    fn dynamic_regions_go_downward() {
        let registry = MemoryRegistry::new();

        let first = registry.alloc_region(0, 1, "a").unwrap();
        let second = registry.alloc_region(0, 1, "b").unwrap();

        assert_eq!(first, DeviceNumber::new(254, 0));
        assert_eq!(second, DeviceNumber::new(253, 0));
    }

    #[test]
    fn dynamic_regions_run_out() {
        let registry = MemoryRegistry::new();

        for _ in MemoryRegistry::DYNAMIC_MAJOR_END..=MemoryRegistry::DYNAMIC_MAJOR_START {
            registry.alloc_region(0, 1, "filler").unwrap();
        }

        assert_eq!(registry.alloc_region(0, 1, "late"), Err(CharDeviceError::Busy));
    }

    #[test]
    fn nodes_need_their_class() {
        let registry = MemoryRegistry::new();
        let devno = DeviceNumber::new(200, 0);

        assert!(registry.create_node("disks", devno, "disk0").is_err());

        registry.create_class("disks").unwrap();
        assert_eq!(registry.create_class("disks"), Err(CharDeviceError::Busy));

        registry.create_node("disks", devno, "disk0").unwrap();
        assert_eq!(
            registry.create_node("disks", DeviceNumber::new(200, 1), "disk0"),
            Err(CharDeviceError::Busy)
        );
        assert_eq!(registry.node_name("disks", devno).as_deref(), Some("disk0"));

        registry.destroy_node("disks", devno);
        assert_eq!(registry.node_name("disks", devno), None);

        registry.destroy_class("disks");
        assert!(!registry.has_class("disks"));
    }
}
