//! Per-device context
//!
//! A [`QuirkDevice`] owns everything a paired device needs: the raw
//! manufacturer attribute cache, the synthetic clusters of its replacement
//! graph, the outbound command sender and the attribute event broadcaster.
//! Vendor decoders receive the [`DeviceState`] half and update synthetic
//! attributes through typed calls; every change is published as an
//! [`AttributeEvent`].

use crate::clusters::{
    ClusterSpec, Feature, LocalCluster, MeasurementKind, ModeUpdate, ThermostatCluster,
};
use crate::config::QuirkConfig;
use crate::convert::apply_direct;
use crate::error::QuirkError;
use crate::manufacturer::{ManufValue, ManufWrite, ManufacturerCluster};
use crate::quirk::{Quirk, QuirkDescriptor, Target};
use chrono::{Local, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{broadcast, mpsc};
use tuya_protocol::{
    DpValue, ProtocolError, TimePayload, TuyaCommand, TuyaCommandId, TUYA_CLUSTER_ID,
};
use zigbee_core::cluster::{
    on_off_attrs, thermostat_attrs, OnOffCommand, SetpointMode, Status, SystemMode,
    ThermostatCommand,
};
use zigbee_core::{format_ieee, WriteStatusRecord, ZclValue, ZigbeeDevice};

/// A synthetic attribute changed
#[derive(Debug, Clone, Serialize)]
pub struct AttributeEvent {
    pub ieee: [u8; 8],
    pub endpoint: u8,
    pub cluster: u16,
    pub attr: u16,
    pub value: ZclValue,
}

/// Command for the device's manufacturer cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    SetData(TuyaCommand),
    SetTime(TimePayload),
}

impl OutboundCommand {
    #[must_use]
    pub fn command_id(&self) -> TuyaCommandId {
        match self {
            OutboundCommand::SetData(_) => TuyaCommandId::SetData,
            OutboundCommand::SetTime(_) => TuyaCommandId::SetTime,
        }
    }

    /// Cluster command payload
    #[allow(clippy::missing_errors_doc)]
    pub fn payload(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            OutboundCommand::SetData(cmd) => cmd.serialize(),
            OutboundCommand::SetTime(time) => Ok(time.serialize()),
        }
    }
}

/// Addressed outbound command, drained by the host transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub ieee: [u8; 8],
    pub nwk: u16,
    pub endpoint: u8,
    pub cluster: u16,
    pub command: OutboundCommand,
}

/// Cached state of one device, handed to vendor decoders
#[derive(Debug)]
pub struct DeviceState {
    ieee: [u8; 8],
    manuf: ManufacturerCluster,
    specs: BTreeMap<(u8, u16), ClusterSpec>,
    clusters: BTreeMap<(u8, u16), LocalCluster>,
    features: HashMap<Feature, (u8, u16)>,
    events: broadcast::Sender<AttributeEvent>,
}

impl DeviceState {
    fn new(
        ieee: [u8; 8],
        quirk: &dyn Quirk,
        descriptor: &QuirkDescriptor,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        let mut specs = BTreeMap::new();
        let mut clusters = BTreeMap::new();
        let mut features = HashMap::new();

        for layout in &descriptor.replacement {
            for spec in &layout.clusters {
                let key = (layout.id, spec.cluster_id());
                if let Some(feature) = spec.feature() {
                    features.insert(feature, key);
                }
                if let Some(cluster) = spec.build() {
                    clusters.insert(key, cluster);
                }
                specs.insert(key, *spec);
            }
        }

        Self {
            ieee,
            manuf: ManufacturerCluster::new(quirk.attributes()),
            specs,
            clusters,
            features,
            events,
        }
    }

    #[must_use]
    pub fn ieee(&self) -> [u8; 8] {
        self.ieee
    }

    #[must_use]
    pub fn manufacturer(&self) -> &ManufacturerCluster {
        &self.manuf
    }

    pub fn manufacturer_mut(&mut self) -> &mut ManufacturerCluster {
        &mut self.manuf
    }

    /// Replacement spec of a cluster
    #[allow(clippy::missing_errors_doc)]
    pub fn spec(&self, endpoint: u8, cluster: u16) -> Result<ClusterSpec, QuirkError> {
        if let Some(spec) = self.specs.get(&(endpoint, cluster)) {
            return Ok(*spec);
        }
        if self.specs.keys().any(|(ep, _)| *ep == endpoint) {
            Err(QuirkError::ClusterNotFound { endpoint, cluster })
        } else {
            Err(QuirkError::EndpointNotFound(endpoint))
        }
    }

    #[must_use]
    pub fn cluster(&self, endpoint: u8, cluster: u16) -> Option<&LocalCluster> {
        self.clusters.get(&(endpoint, cluster))
    }

    #[must_use]
    pub fn thermostat(&self) -> Option<&ThermostatCluster> {
        self.clusters.values().find_map(|c| match c {
            LocalCluster::Thermostat(t) => Some(t),
            _ => None,
        })
    }

    pub fn thermostat_mut(&mut self) -> Option<&mut ThermostatCluster> {
        self.clusters.values_mut().find_map(|c| match c {
            LocalCluster::Thermostat(t) => Some(t),
            _ => None,
        })
    }

    /// Cached thermostat attribute
    #[must_use]
    pub fn thermostat_attr(&self, attr: u16) -> Option<i64> {
        self.thermostat().and_then(|t| t.get(attr))
    }

    #[must_use]
    pub fn feature(&self, feature: Feature) -> Option<&LocalCluster> {
        self.features
            .get(&feature)
            .and_then(|key| self.clusters.get(key))
    }

    fn feature_mut(&mut self, feature: Feature) -> Option<&mut LocalCluster> {
        let key = self.features.get(&feature)?;
        self.clusters.get_mut(key)
    }

    /// Cached state of a feature switch
    #[must_use]
    pub fn switch_state(&self, feature: Feature) -> Option<bool> {
        match self.feature(feature)? {
            LocalCluster::OnOff(c) => c.on_off(),
            _ => None,
        }
    }

    /// Cached present value of an analog control
    #[must_use]
    pub fn analog_value(&self, feature: Feature) -> Option<f64> {
        match self.feature(feature)? {
            LocalCluster::AnalogOutput(c) => c.present_value(),
            _ => None,
        }
    }

    fn with_thermostat(&mut self, f: impl FnOnce(&mut ThermostatCluster)) {
        match self.thermostat_mut() {
            Some(thermostat) => f(thermostat),
            None => tracing::debug!("{} has no thermostat cluster", format_ieee(&self.ieee)),
        }
    }

    pub fn temperature_change(&mut self, attr: u16, value: i64) {
        self.with_thermostat(|t| t.temperature_change(attr, value));
    }

    pub fn state_change(&mut self, heating: bool) {
        self.with_thermostat(|t| t.state_change(heating));
    }

    pub fn apply_mode(&mut self, update: ModeUpdate) {
        self.with_thermostat(|t| t.apply_mode(update));
    }

    pub fn set_system_mode(&mut self, mode: SystemMode) {
        self.with_thermostat(|t| t.set_system_mode(mode));
    }

    pub fn set_switch(&mut self, feature: Feature, on: bool) {
        match self.feature_mut(feature) {
            Some(LocalCluster::OnOff(c)) => c.set(on),
            _ => tracing::debug!("No switch for {:?}", feature),
        }
    }

    pub fn set_analog(&mut self, feature: Feature, value: f64) {
        match self.feature_mut(feature) {
            Some(LocalCluster::AnalogOutput(c)) => c.set_present_value(value),
            _ => tracing::debug!("No analog control for {:?}", feature),
        }
    }

    pub fn set_binary(&mut self, feature: Feature, active: bool) {
        match self.feature_mut(feature) {
            Some(LocalCluster::BinaryInput(c)) => c.set(active),
            _ => tracing::debug!("No binary input for {:?}", feature),
        }
    }

    /// Battery level in percent
    pub fn battery_change(&mut self, percent: f64) {
        let power = self.clusters.values_mut().find_map(|c| match c {
            LocalCluster::PowerConfiguration(p) => Some(p),
            _ => None,
        });
        match power {
            Some(power) => power.battery_change(percent),
            None => tracing::debug!("No power configuration cluster"),
        }
    }

    /// Low battery flag: 0 % when set, 100 % otherwise
    pub fn battery_low(&mut self, low: bool) {
        self.battery_change(if low { 0.0 } else { 100.0 });
    }

    /// Child lock mirrors into the keypad lockout and the child lock switch
    pub fn child_lock_change(&mut self, locked: bool) {
        for cluster in self.clusters.values_mut() {
            if let LocalCluster::UserInterface(ui) = cluster {
                ui.child_lock_change(locked);
            }
        }
        self.set_switch(Feature::ChildLock, locked);
    }

    pub fn set_measurement(&mut self, kind: MeasurementKind, measured: i64) {
        for cluster in self.clusters.values_mut() {
            if let LocalCluster::Measurement(m) = cluster {
                if m.kind() == kind {
                    m.set(measured);
                }
            }
        }
    }

    /// Publish every pending synthetic attribute change
    fn flush(&mut self) {
        for (&(endpoint, cluster), local) in &mut self.clusters {
            for (attr, value) in local.attrs_mut().drain_pending() {
                let _ = self.events.send(AttributeEvent {
                    ieee: self.ieee,
                    endpoint,
                    cluster,
                    attr,
                    value,
                });
            }
        }
    }
}

/// A paired device driven through its quirk
pub struct QuirkDevice {
    quirk_name: &'static str,
    nwk: u16,
    quirk: Box<dyn Quirk>,
    state: DeviceState,
    manuf_endpoint: u8,
    outbound: mpsc::Sender<Outbound>,
    time_offset_year: i32,
}

impl std::fmt::Debug for QuirkDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuirkDevice")
            .field("quirk", &self.quirk_name)
            .field("nwk", &self.nwk)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl QuirkDevice {
    /// Build the device context for `descriptor`
    #[must_use]
    pub fn new(
        device: &ZigbeeDevice,
        descriptor: &QuirkDescriptor,
        outbound: mpsc::Sender<Outbound>,
        config: &QuirkConfig,
    ) -> Self {
        let manufacturer = device.manufacturer.as_deref().unwrap_or_default();
        let quirk = (descriptor.build)(manufacturer);
        let mut state = DeviceState::new(
            device.ieee_address,
            quirk.as_ref(),
            descriptor,
            config.event_capacity,
        );

        let manuf_endpoint = descriptor
            .replacement
            .iter()
            .find(|layout| layout.clusters.contains(&ClusterSpec::Manufacturer))
            .map_or(1, |layout| layout.id);

        quirk.initialize(&mut state);
        // Construction-time values are the initial state, not changes
        for cluster in state.clusters.values_mut() {
            cluster.attrs_mut().drain_pending();
        }

        Self {
            quirk_name: descriptor.name,
            nwk: device.nwk_address,
            quirk,
            state,
            manuf_endpoint,
            outbound,
            time_offset_year: config.time_offset_year,
        }
    }

    #[must_use]
    pub fn quirk_name(&self) -> &'static str {
        self.quirk_name
    }

    #[must_use]
    pub fn ieee(&self) -> [u8; 8] {
        self.state.ieee
    }

    #[must_use]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AttributeEvent> {
        self.state.events.subscribe()
    }

    /// Handle a decoded manufacturer attribute report
    pub fn handle_report(&mut self, attr: u16, value: DpValue) {
        if !self.state.manuf.record(attr, value.clone()) {
            tracing::debug!(
                "[{}] Cached unknown attribute 0x{:04X}: {:?}",
                format_ieee(&self.state.ieee),
                attr,
                value
            );
            return;
        }

        tracing::debug!(
            "[{}] Received {} (0x{:04X}): {:?}",
            format_ieee(&self.state.ieee),
            self.state.manuf.name(attr).unwrap_or("?"),
            attr,
            value
        );

        if let Some(raw) = value.as_int() {
            if let Some((thermostat_attr, converted)) = apply_direct(
                self.quirk.direct_mappings(),
                self.quirk.report_guard(),
                attr,
                raw,
            ) {
                self.state.temperature_change(thermostat_attr, converted);
            }
        }

        self.quirk.decode(&mut self.state, attr, &value);
        self.state.flush();
    }

    /// Handle a command received on the manufacturer cluster
    #[allow(clippy::missing_errors_doc)]
    pub async fn handle_cluster_command(
        &mut self,
        command_id: u8,
        payload: &[u8],
    ) -> Result<(), QuirkError> {
        match TuyaCommandId::from_u8(command_id) {
            Some(id) if id.is_report() => {
                let command = TuyaCommand::deserialize(payload)?;
                for datapoint in command.datapoints {
                    self.handle_report(datapoint.attr_id(), datapoint.value);
                }
            }
            Some(TuyaCommandId::SetTime) => {
                let offset = Local::now().offset().local_minus_utc();
                let time = TimePayload::at(Utc::now(), offset, self.time_offset_year);
                tracing::debug!(
                    "[{}] Answering time request: {:?}",
                    format_ieee(&self.state.ieee),
                    time
                );
                self.send(OutboundCommand::SetTime(time)).await?;
            }
            _ => {
                tracing::debug!(
                    "[{}] Ignoring manufacturer command 0x{:02X}",
                    format_ieee(&self.state.ieee),
                    command_id
                );
            }
        }
        Ok(())
    }

    /// Read a cached attribute
    #[must_use]
    pub fn read_attribute(&self, endpoint: u8, cluster: u16, attr: u16) -> Option<ZclValue> {
        match self.state.spec(endpoint, cluster).ok()? {
            ClusterSpec::Manufacturer => match self.state.manuf.get(attr)? {
                DpValue::Bool(v) => Some(ZclValue::Bool(*v)),
                DpValue::String(s) => Some(ZclValue::Text(s.clone())),
                DpValue::Raw(_) => None,
                other => other.as_int().map(ZclValue::Int),
            },
            _ => self.state.cluster(endpoint, cluster)?.attrs().get(attr).cloned(),
        }
    }

    /// Write standard attributes
    ///
    /// Every record is mapped to manufacturer attributes; the union is sent
    /// as one `set_data` command. If nothing maps, each record fails.
    #[allow(clippy::missing_errors_doc)]
    pub async fn write_attributes(
        &mut self,
        endpoint: u8,
        cluster: u16,
        records: &[(u16, ZclValue)],
    ) -> Result<Vec<WriteStatusRecord>, QuirkError> {
        let spec = self.state.spec(endpoint, cluster)?;
        if records.is_empty() {
            return Ok(vec![WriteStatusRecord::success()]);
        }

        let target = match spec {
            ClusterSpec::Passthrough(_) => {
                return Err(QuirkError::ClusterNotFound { endpoint, cluster })
            }
            ClusterSpec::Manufacturer => return self.write_manufacturer(records).await,
            ClusterSpec::Thermostat(_) => Some(Target::Thermostat),
            ClusterSpec::UserInterface => Some(Target::UserInterface),
            ClusterSpec::OnOff(feature) => Some(Target::Switch(feature)),
            ClusterSpec::AnalogOutput(feature, _) => Some(Target::Analog(feature)),
            _ => None,
        };

        let mut merged = ManufWrite::new();
        let mut accepted = Vec::new();
        for (attr, value) in records {
            let writable = match self.state.cluster(endpoint, cluster) {
                Some(LocalCluster::AnalogOutput(c)) => c.accepts_write(*attr),
                _ => true,
            };
            let mapped = target
                .filter(|_| writable)
                .and_then(|t| self.quirk.map_attribute(&self.state, t, *attr, value))
                .filter(|w| !w.is_empty());

            match mapped {
                Some(write) => {
                    tracing::debug!(
                        "[0x{:04x}:{}:0x{:04x}] Mapping standard 0x{:04x} with value {:?} to custom {:?}",
                        self.nwk,
                        endpoint,
                        cluster,
                        attr,
                        value,
                        write
                    );
                    crate::manufacturer::merge_write(&mut merged, write);
                    accepted.push((*attr, value));
                }
                None => tracing::warn!(
                    "[0x{:04x}:{}:0x{:04x}] Unsupported write of 0x{:04x}: {:?}",
                    self.nwk,
                    endpoint,
                    cluster,
                    attr,
                    value
                ),
            }
        }

        if merged.is_empty() {
            return Ok(records
                .iter()
                .map(|(attr, _)| WriteStatusRecord::failure(*attr))
                .collect());
        }

        if !self.send_write(&merged).await? {
            return Ok(records
                .iter()
                .map(|(attr, _)| WriteStatusRecord::failure(*attr))
                .collect());
        }

        if let Some(LocalCluster::AnalogOutput(c)) = self.state.clusters.get_mut(&(endpoint, cluster)) {
            for (_, value) in &accepted {
                if let Some(v) = value.as_float() {
                    c.set_present_value(v);
                }
            }
        }
        if let Some(target) = target {
            for (attr, value) in &accepted {
                self.quirk.write_sent(&mut self.state, target, *attr, value);
            }
        }
        self.state.flush();
        Ok(vec![WriteStatusRecord::success()])
    }

    async fn write_manufacturer(
        &mut self,
        records: &[(u16, ZclValue)],
    ) -> Result<Vec<WriteStatusRecord>, QuirkError> {
        let mut writes = ManufWrite::new();
        for (attr, value) in records {
            match value {
                ZclValue::Text(s) => writes.push((*attr, ManufValue::Bytes(s.as_bytes().to_vec()))),
                other => match other.as_int() {
                    Some(v) => writes.push((*attr, ManufValue::Int(v))),
                    None => tracing::warn!("Cannot write {:?} to 0x{:04X}", other, attr),
                },
            }
        }
        if writes.is_empty() {
            return Ok(records
                .iter()
                .map(|(attr, _)| WriteStatusRecord::failure(*attr))
                .collect());
        }
        if !self.send_write(&writes).await? {
            return Ok(records
                .iter()
                .map(|(attr, _)| WriteStatusRecord::failure(*attr))
                .collect());
        }
        Ok(vec![WriteStatusRecord::success()])
    }

    /// Invoke a cluster command on a synthetic cluster
    #[allow(clippy::missing_errors_doc)]
    pub async fn command(
        &mut self,
        endpoint: u8,
        cluster: u16,
        command_id: u8,
        args: &[i64],
    ) -> Result<Status, QuirkError> {
        match self.state.spec(endpoint, cluster)? {
            ClusterSpec::OnOff(feature) => self.switch_command(endpoint, feature, command_id).await,
            ClusterSpec::Thermostat(_)
                if command_id == ThermostatCommand::SetpointRaiseLower as u8 =>
            {
                self.setpoint_raise_lower(endpoint, args).await
            }
            _ => {
                tracing::warn!(
                    "[0x{:04x}:{}:0x{:04x}] Unsupported command 0x{:02x}",
                    self.nwk,
                    endpoint,
                    cluster,
                    command_id
                );
                Ok(Status::UnsupClusterCommand)
            }
        }
    }

    async fn switch_command(
        &mut self,
        endpoint: u8,
        feature: Feature,
        command_id: u8,
    ) -> Result<Status, QuirkError> {
        let on = match OnOffCommand::try_from(command_id) {
            Ok(OnOffCommand::Off) => false,
            Ok(OnOffCommand::On) => true,
            Ok(OnOffCommand::Toggle) => match self.state.switch_state(feature) {
                Some(current) => !current,
                None => return Ok(Status::Failure),
            },
            Err(other) => {
                tracing::warn!("Unsupported on/off command 0x{:02x} for {:?}", other, feature);
                return Ok(Status::UnsupClusterCommand);
            }
        };

        let records = self
            .write_attributes(
                endpoint,
                zigbee_core::cluster::id::ON_OFF,
                &[(on_off_attrs::ON_OFF, ZclValue::Bool(on))],
            )
            .await?;
        Ok(records.first().map_or(Status::Failure, |r| r.status))
    }

    /// Relative setpoint change; the amount is in decidegrees
    async fn setpoint_raise_lower(&mut self, endpoint: u8, args: &[i64]) -> Result<Status, QuirkError> {
        let (Some(&mode), Some(&amount)) = (args.first(), args.get(1)) else {
            return Ok(Status::InvalidValue);
        };
        let mode = u8::try_from(mode).ok().and_then(|m| SetpointMode::try_from(m).ok());
        if !matches!(mode, Some(SetpointMode::Heat | SetpointMode::Both)) {
            return Ok(Status::InvalidValue);
        }

        let Some(current) = self
            .state
            .thermostat_attr(thermostat_attrs::OCCUPIED_HEATING_SETPOINT)
        else {
            tracing::error!(
                "[{}] No cached heating setpoint for a relative change",
                format_ieee(&self.state.ieee)
            );
            return Ok(Status::Failure);
        };

        let records = self
            .write_attributes(
                endpoint,
                zigbee_core::cluster::id::THERMOSTAT,
                &[(
                    thermostat_attrs::OCCUPIED_HEATING_SETPOINT,
                    ZclValue::Int(current + amount * 10),
                )],
            )
            .await?;
        Ok(records.first().map_or(Status::Failure, |r| r.status))
    }

    /// Queue a `set_data`; `false` when a value does not fit its data point
    async fn send_write(&mut self, writes: &[(u16, ManufValue)]) -> Result<bool, QuirkError> {
        let command = match self.state.manuf.encode_write(writes) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(
                    "[{}] Rejecting write {:?}: {}",
                    format_ieee(&self.state.ieee),
                    writes,
                    e
                );
                return Ok(false);
            }
        };
        tracing::debug!(
            "[{}] Sending set_data tsn {}: {:?}",
            format_ieee(&self.state.ieee),
            command.tsn,
            command.datapoints
        );
        self.send(OutboundCommand::SetData(command)).await?;
        Ok(true)
    }

    async fn send(&self, command: OutboundCommand) -> Result<(), QuirkError> {
        self.outbound
            .send(Outbound {
                ieee: self.state.ieee,
                nwk: self.nwk,
                endpoint: self.manuf_endpoint,
                cluster: TUYA_CLUSTER_ID,
                command,
            })
            .await
            .map_err(|_| QuirkError::ChannelClosed)
    }
}
