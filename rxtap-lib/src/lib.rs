// Unsafe is limited to one documented FFI call: cpu.rs reads the current CPU
// through libc::sched_getcpu. Everything else is denied.
#![deny(unsafe_code)]

pub mod classifier;
pub mod config;
pub mod cpu;
pub mod error;
pub mod filter;
pub mod host;
pub mod registry;
pub mod report;
#[cfg(unix)]
pub mod tap;
pub mod telemetry;

pub use classifier::{Classification, Disposition, FrameHandler, PacketClassifier, StatsSnapshot};
pub use config::{load_from_path, CaptureConfig, Config, LinkLayer, LoggingConfig};
pub use error::{HostError, RegistryError, Result, RxTapError};
pub use filter::InterfaceFilter;
pub use host::{InterfaceDescriptor, NetHost, RegistrationHandle};
pub use registry::{AttachSummary, DeviceRegistry, InterceptedInterface};
pub use report::{forward, IpRecord, NullSink, QueueSink, Record, ReportSink, TcpRecord, TracingSink};
#[cfg(unix)]
pub use tap::{run, run_until, TapReport};
pub use telemetry::init_tracing;
