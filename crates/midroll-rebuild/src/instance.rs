//! Instance, physical-device, and surface recreation.

use std::collections::BTreeMap;

use midroll_protocol::commands::*;
use midroll_protocol::handle::*;
use midroll_protocol::Command;
use midroll_state::snapshot::{InstanceRecord, SurfaceRecord, SurfaceType};

use crate::writer::StreamBuilder;

impl<'a> StreamBuilder<'a> {
    pub(crate) fn create_instance(&mut self, inst: &InstanceRecord) {
        for layer in &inst.enabled_layers {
            self.alloc_read(layer);
        }
        self.alloc_read(&inst.enabled_layers);
        for ext in &inst.enabled_extensions {
            self.alloc_read(ext);
        }
        self.alloc_read(&inst.enabled_extensions);
        self.alloc_write(&inst.handle);
        self.emit(Command::CreateInstance {
            enabled_layers: inst.enabled_layers.clone(),
            enabled_extensions: inst.enabled_extensions.clone(),
            instance: inst.handle,
        });
    }

    /// Physical devices are introduced per instance with the count-query /
    /// full-query pair of `vkEnumeratePhysicalDevices`, followed by the
    /// property queries the capture observed for each device.
    pub(crate) fn create_physical_devices(&mut self) {
        let mut groups: BTreeMap<InstanceHandle, Vec<PhysicalDeviceHandle>> = BTreeMap::new();
        for pd in self.snapshot().physical_devices.values() {
            groups.entry(pd.instance).or_default().push(pd.handle);
        }

        for (instance, devices) in groups {
            let count = devices.len() as u32;

            self.alloc_write(&count);
            self.emit(Command::EnumeratePhysicalDevices {
                instance,
                device_count: count,
                devices: None,
            });

            self.alloc_read(&count);
            self.alloc_read(&devices);
            self.emit(Command::EnumeratePhysicalDevices {
                instance,
                device_count: count,
                devices: Some(devices.clone()),
            });

            for handle in devices {
                let Some(pd) = self.snapshot().physical_devices.get(&handle) else {
                    continue;
                };

                self.alloc_write(&pd.properties);
                self.emit(Command::GetPhysicalDeviceProperties {
                    physical_device: handle,
                    properties: pd.properties.clone(),
                });

                self.alloc_write(&pd.memory_properties);
                self.emit(Command::GetPhysicalDeviceMemoryProperties {
                    physical_device: handle,
                    properties: pd.memory_properties.clone(),
                });

                let family_count = pd.queue_family_properties.len() as u32;
                self.alloc_write(&family_count);
                self.emit(Command::GetPhysicalDeviceQueueFamilyProperties {
                    physical_device: handle,
                    family_count,
                    families: None,
                });

                let families: Vec<QueueFamilyProperties> =
                    pd.queue_family_properties.values().cloned().collect();
                self.alloc_read(&family_count);
                self.unpack_write_map(&pd.queue_family_properties);
                self.emit(Command::GetPhysicalDeviceQueueFamilyProperties {
                    physical_device: handle,
                    family_count,
                    families: Some(families),
                });
            }
        }
    }

    /// Windowing-system fields are emitted as zero; the replay environment
    /// provides its own windowing state.
    pub(crate) fn create_surface(&mut self, surface: &SurfaceRecord) {
        let cmd = match surface.surface_type {
            SurfaceType::Xcb => Command::CreateXcbSurfaceKhr {
                instance: surface.instance,
                connection: 0,
                window: 0,
                surface: surface.handle,
            },
            SurfaceType::Android => Command::CreateAndroidSurfaceKhr {
                instance: surface.instance,
                window: 0,
                surface: surface.handle,
            },
            SurfaceType::Win32 => Command::CreateWin32SurfaceKhr {
                instance: surface.instance,
                hinstance: 0,
                hwnd: 0,
                surface: surface.handle,
            },
            SurfaceType::Wayland => Command::CreateWaylandSurfaceKhr {
                instance: surface.instance,
                display: 0,
                wl_surface: 0,
                surface: surface.handle,
            },
            SurfaceType::Xlib => Command::CreateXlibSurfaceKhr {
                instance: surface.instance,
                dpy: 0,
                window: 0,
                surface: surface.handle,
            },
            SurfaceType::Mir => Command::CreateMirSurfaceKhr {
                instance: surface.instance,
                connection: 0,
                mir_surface: 0,
                surface: surface.handle,
            },
        };
        self.alloc_read(&0u64);
        self.alloc_write(&surface.handle);
        self.emit(cmd);
    }
}
