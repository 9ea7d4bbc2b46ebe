//! Persistent operator settings, NVS-backed.
//!
//! Implements [`SettingsPort`]. The blob is a two-byte magic/version
//! header followed by the postcard encoding of [`Settings`]; a header
//! mismatch or a decode failure reports [`SettingsError::Corrupted`] and
//! the caller falls back to defaults. Every loaded or stored value is
//! range-checked against the system configuration, so invalid settings are
//! never persisted and never reach the control loop.
//!
//! On ESP-IDF the blob lives in NVS; the simulation backend is an
//! in-memory map for host tests.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::SettingsPort;
use crate::config::{Settings, SystemConfig};
use crate::error::SettingsError;

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Identifies an etchbath settings blob.
const SETTINGS_MAGIC: u8 = 0xB7;
/// Bumped whenever the settings layout changes incompatibly.
const SETTINGS_VERSION: u8 = 1;

#[cfg(target_os = "espidf")]
const NVS_NAMESPACE: &[u8] = b"etchbath\0";
#[cfg(target_os = "espidf")]
const NVS_KEY: &[u8] = b"settings\0";
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

pub struct SettingsStore {
    config: SystemConfig,
    #[cfg(not(target_os = "espidf"))]
    blob: RefCell<Option<Vec<u8>>>,
}

impl SettingsStore {
    /// Open the settings store. On ESP-IDF this initialises the NVS flash
    /// partition (erasing and retrying after a version bump, the standard
    /// recovery); the simulation backend starts empty.
    pub fn new(config: &SystemConfig) -> Result<Self, SettingsError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the single main-task context before
            // any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("settings: erasing and re-initialising NVS partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(SettingsError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(SettingsError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(SettingsError::IoError);
            }
            info!("settings: NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("settings: simulation backend");

        Ok(Self {
            config: config.clone(),
            #[cfg(not(target_os = "espidf"))]
            blob: RefCell::new(None),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<Settings, SettingsError> {
        let [magic, version, payload @ ..] = bytes else {
            return Err(SettingsError::Corrupted);
        };
        if *magic != SETTINGS_MAGIC || *version != SETTINGS_VERSION {
            return Err(SettingsError::Corrupted);
        }
        let settings: Settings =
            postcard::from_bytes(payload).map_err(|_| SettingsError::Corrupted)?;
        settings
            .validate(&self.config)
            .map_err(SettingsError::ValidationFailed)?;
        Ok(settings)
    }

    fn encode(&self, settings: &Settings) -> Result<Vec<u8>, SettingsError> {
        settings
            .validate(&self.config)
            .map_err(SettingsError::ValidationFailed)?;
        let mut bytes = vec![SETTINGS_MAGIC, SETTINGS_VERSION];
        bytes.extend(postcard::to_allocvec(settings).map_err(|_| SettingsError::IoError)?);
        Ok(bytes)
    }

    /// Open the NVS namespace, run `f` with the handle, close it.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let ret = unsafe { nvs_open(NVS_NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Vec<u8>, SettingsError> {
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size: usize = 0;
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    NVS_KEY.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                return Err(ret);
            }
            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    NVS_KEY.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });
        match result {
            Ok(bytes) => Ok(bytes),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(SettingsError::NotFound),
            Err(_) => Err(SettingsError::IoError),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Vec<u8>, SettingsError> {
        self.blob.borrow().clone().ok_or(SettingsError::NotFound)
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), SettingsError> {
        let result = Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    NVS_KEY.as_ptr() as *const _,
                    bytes.as_ptr() as *const _,
                    bytes.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("settings: NVS write error {e}");
            SettingsError::IoError
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), SettingsError> {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
        Ok(())
    }

    /// Test hook: inject a raw blob as if it were already in storage.
    #[cfg(all(test, not(target_os = "espidf")))]
    fn inject_blob(&self, bytes: Vec<u8>) {
        *self.blob.borrow_mut() = Some(bytes);
    }
}

impl SettingsPort for SettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        let bytes = self.read_blob()?;
        let settings = self.decode(&bytes)?;
        info!("settings: loaded ({} bytes)", bytes.len());
        Ok(settings)
    }

    fn store(&mut self, settings: &Settings) -> Result<(), SettingsError> {
        let bytes = self.encode(settings)?;
        self.write_blob(&bytes)?;
        info!("settings: stored ({} bytes)", bytes.len());
        Ok(())
    }
}
