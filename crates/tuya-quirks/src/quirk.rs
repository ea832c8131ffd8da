//! Quirk trait and device descriptors

use crate::clusters::{ClusterSpec, Feature};
use crate::convert::{DirectMapping, ReportGuard};
use crate::device::DeviceState;
use crate::manufacturer::{ManufAttr, ManufWrite};
use tuya_protocol::DpValue;
use zigbee_core::cluster::HA_PROFILE;
use zigbee_core::{Endpoint, ZclValue};

/// Synthetic cluster a controller write is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Thermostat,
    UserInterface,
    Switch(Feature),
    Analog(Feature),
}

/// Translation between one vendor's data points and the standard clusters
///
/// Implementations hold the per-model configuration record selected at
/// construction; all per-device state lives in [`DeviceState`].
pub trait Quirk: Send + Sync {
    /// Data points the firmware reports
    fn attributes(&self) -> &'static [ManufAttr];

    /// Manufacturer attributes mirrored straight into the Thermostat cluster
    fn direct_mappings(&self) -> &[DirectMapping] {
        &[]
    }

    fn report_guard(&self) -> ReportGuard {
        ReportGuard::None
    }

    /// Seed synthetic attributes that do not come from reports
    fn initialize(&self, _state: &mut DeviceState) {}

    /// Decode a stored report into synthetic attribute updates
    ///
    /// Runs after the direct mapping has been applied.
    fn decode(&self, state: &mut DeviceState, attr: u16, value: &DpValue);

    /// Map a standard attribute write to manufacturer attributes
    ///
    /// `None` means the write is not supported.
    fn map_attribute(
        &self,
        state: &DeviceState,
        target: Target,
        attr: u16,
        value: &ZclValue,
    ) -> Option<ManufWrite>;

    /// Reflect a sent write in the synthetic clusters before the device reports it
    fn write_sent(&self, _state: &mut DeviceState, _target: Target, _attr: u16, _value: &ZclValue) {}
}

/// One endpoint of the replacement graph
#[derive(Debug, Clone)]
pub struct EndpointLayout {
    pub id: u8,
    pub profile_id: u16,
    pub device_id: u16,
    pub clusters: Vec<ClusterSpec>,
    pub out_clusters: Vec<u16>,
}

impl EndpointLayout {
    /// Home Automation endpoint
    #[must_use]
    pub fn new(id: u8, device_id: u16) -> Self {
        Self {
            id,
            profile_id: HA_PROFILE,
            device_id,
            clusters: Vec::new(),
            out_clusters: Vec::new(),
        }
    }

    #[must_use]
    pub fn profile(mut self, profile_id: u16) -> Self {
        self.profile_id = profile_id;
        self
    }

    #[must_use]
    pub fn with(mut self, spec: ClusterSpec) -> Self {
        self.clusters.push(spec);
        self
    }

    /// Host-owned input clusters
    #[must_use]
    pub fn passthrough(mut self, clusters: &[u16]) -> Self {
        self.clusters
            .extend(clusters.iter().map(|c| ClusterSpec::Passthrough(*c)));
        self
    }

    #[must_use]
    pub fn with_out(mut self, clusters: &[u16]) -> Self {
        self.out_clusters.extend_from_slice(clusters);
        self
    }

    /// The endpoint as the host should present it
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        let in_clusters: Vec<u16> = self.clusters.iter().map(ClusterSpec::cluster_id).collect();
        Endpoint::new(self.id, self.profile_id, self.device_id)
            .with_in(&in_clusters)
            .with_out(&self.out_clusters)
    }
}

/// Factory for a quirk, given the device's manufacturer string
pub type QuirkBuilder = fn(&str) -> Box<dyn Quirk>;

/// Matching rules and replacement graph of one quirk variant
#[derive(Clone)]
pub struct QuirkDescriptor {
    pub name: &'static str,
    /// `(manufacturer, model)` pairs
    pub models: &'static [(&'static str, &'static str)],
    /// Endpoints the unmodified device advertises
    pub signature: Vec<Endpoint>,
    pub replacement: Vec<EndpointLayout>,
    pub build: QuirkBuilder,
}

impl std::fmt::Debug for QuirkDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuirkDescriptor")
            .field("name", &self.name)
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}

impl QuirkDescriptor {
    #[must_use]
    pub fn lists(&self, manufacturer: &str, model: &str) -> bool {
        self.models
            .iter()
            .any(|(m, md)| *m == manufacturer && *md == model)
    }

    /// Every advertised endpoint matches the signature, ignoring cluster order
    #[must_use]
    pub fn matches_signature(&self, endpoints: &[Endpoint]) -> bool {
        endpoints.len() == self.signature.len()
            && self.signature.iter().all(|expected| {
                endpoints
                    .iter()
                    .any(|actual| expected.same_layout(actual))
            })
    }

    #[must_use]
    pub fn replacement_endpoints(&self) -> Vec<Endpoint> {
        self.replacement.iter().map(EndpointLayout::endpoint).collect()
    }
}
