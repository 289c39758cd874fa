//! Failure taxonomy for the hypervisor API
//!
//! The remote reports failures as an ordered list of strings: the first
//! element is an error code, the rest are code-specific detail fields.
//! This module maps the code to a closed [`ErrorKind`] enumeration, falling
//! back to [`ErrorKind::Other`] for anything unrecognized. The mapping is
//! pure data; no state, no side effects.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! error_kinds {
    ($($variant:ident => $code:literal,)*) => {
        /// Domain error kinds reported by the hypervisor API
        ///
        /// One variant per known wire error code, plus `Other` for codes
        /// this client does not recognize.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ErrorKind {
            $($variant,)*
            /// Fallback for unrecognized error codes
            Other,
        }

        impl ErrorKind {
            /// Map a wire error code to its kind
            ///
            /// Unrecognized codes map to `ErrorKind::Other`; the original
            /// code string is preserved on the enclosing [`ApiError`].
            pub fn from_code(code: &str) -> Self {
                match code {
                    $($code => ErrorKind::$variant,)*
                    _ => ErrorKind::Other,
                }
            }

            /// The wire code for this kind, if it is one of the named kinds
            pub fn code(&self) -> Option<&'static str> {
                match self {
                    $(ErrorKind::$variant => Some($code),)*
                    ErrorKind::Other => None,
                }
            }
        }
    };
}

error_kinds! {
    BootloaderFailed => "BOOTLOADER_FAILED",
    DeviceAlreadyDetached => "DEVICE_ALREADY_DETACHED",
    DeviceDetachRejected => "DEVICE_DETACH_REJECTED",
    EventsLost => "EVENTS_LOST",
    HaWouldBreakFailoverPlan => "HA_OPERATION_WOULD_BREAK_FAILOVER_PLAN",
    HostNameInvalid => "HOST_NAME_INVALID",
    HostNotEnoughFreeMemory => "HOST_NOT_ENOUGH_FREE_MEMORY",
    IsTunnelAccessPif => "IS_TUNNEL_ACCESS_PIF",
    JoiningHostCannotContainSharedSrs => "JOINING_HOST_CANNOT_CONTAIN_SHARED_SRS",
    LicenceRestriction => "LICENCE_RESTRICTION",
    LicenseProcessingError => "LICENSE_PROCESSING_ERROR",
    NoHostsAvailable => "NO_HOSTS_AVAILABLE",
    OpenvswitchNotActive => "OPENVSWITCH_NOT_ACTIVE",
    OperationNotAllowed => "OPERATION_NOT_ALLOWED",
    OtherOperationInProgress => "OTHER_OPERATION_IN_PROGRESS",
    PifIsPhysical => "PIF_IS_PHYSICAL",
    PifTunnelStillExists => "PIF_TUNNEL_STILL_EXISTS",
    SessionAuthenticationFailed => "SESSION_AUTHENTICATION_FAILED",
    SessionNotRegistered => "SESSION_NOT_REGISTERED",
    SrFull => "SR_FULL",
    SrHasPbd => "SR_HAS_PBD",
    SrOperationNotSupported => "SR_OPERATION_NOT_SUPPORTED",
    SrUnknownDriver => "SR_UNKNOWN_DRIVER",
    TransportPifNotConfigured => "TRANSPORT_PIF_NOT_CONFIGURED",
    UnknownBootloader => "UNKNOWN_BOOTLOADER",
    VbdIsEmpty => "VBD_IS_EMPTY",
    VbdNotEmpty => "VBD_NOT_EMPTY",
    VbdNotRemovableMedia => "VBD_NOT_REMOVABLE_MEDIA",
    VlanTagInvalid => "VLAN_TAG_INVALID",
    VmBadPowerState => "VM_BAD_POWER_STATE",
    VmCheckpointResumeFailed => "VM_CHECKPOINT_RESUME_FAILED",
    VmCheckpointSuspendFailed => "VM_CHECKPOINT_SUSPEND_FAILED",
    VmHvmRequired => "VM_HVM_REQUIRED",
    VmIsTemplate => "VM_IS_TEMPLATE",
    VmMigrateFailed => "VM_MIGRATE_FAILED",
    VmMissingPvDrivers => "VM_MISSING_PV_DRIVERS",
    VmRequiresSr => "VM_REQUIRES_SR",
    VmRevertFailed => "VM_REVERT_FAILED",
    VmSnapshotWithQuiesceFailed => "VM_SNAPSHOT_WITH_QUIESCE_FAILED",
    VmSnapshotWithQuiesceNotSupported => "VM_SNAPSHOT_WITH_QUIESCE_NOT_SUPPORTED",
    VmSnapshotWithQuiescePluginDoesNotRespond => "VM_SNAPSHOT_WITH_QUIESCE_PLUGIN_DOES_NOT_RESPOND",
    VmSnapshotWithQuiesceTimeout => "VM_SNAPSHOT_WITH_QUIESCE_TIMEOUT",
}

/// A typed domain failure reported by the remote API
///
/// Built from the wire error descriptor: the first element becomes the
/// `code` (and is classified into `kind`), the remaining elements are
/// carried verbatim as `details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Classified error kind
    pub kind: ErrorKind,
    /// The original wire error code, preserved even for unrecognized codes
    pub code: String,
    /// Error-specific detail fields, in wire order
    pub details: Vec<String>,
}

impl ApiError {
    /// Build an `ApiError` from a wire error descriptor
    ///
    /// The descriptor's first element is the error code; the rest are
    /// detail fields. An empty descriptor yields `ErrorKind::Other` with
    /// an empty code.
    pub fn from_description(mut description: Vec<String>) -> Self {
        if description.is_empty() {
            return Self {
                kind: ErrorKind::Other,
                code: String::new(),
                details: Vec::new(),
            };
        }
        let details = description.split_off(1);
        let code = description.pop().unwrap_or_default();
        Self {
            kind: ErrorKind::from_code(&code),
            code,
            details,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.details.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} [{}]", self.code, self.details.join(", "))
        }
    }
}

impl std::error::Error for ApiError {}
