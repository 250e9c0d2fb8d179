//! Frequency-swept channel data and the operations that align, unwrap and combine it.
pub mod alignment;
pub mod combine;
pub mod error;
pub mod phase;

pub use error::DatasetError;

use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt;

type Result<T> = std::result::Result<T, DatasetError>;

/// Key of a measured main-array composite sweep. Never summed with the main array.
pub const COMBINED_MAIN_KEY: &str = "M_combined";
/// Key of a measured interferometer-array composite sweep.
pub const COMBINED_INTF_KEY: &str = "I_combined";
/// Key of a measured attenuator sweep.
pub const ATTENUATOR_KEY: &str = "atten_file";

/// One measurement at a single frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub frequency_hz: i64,
    pub magnitude_db: Option<f64>,
    pub vswr: Option<f64>,
    pub phase_deg: Option<f64>,
    pub phase_rad: Option<f64>,
}
impl Sample {
    pub fn new(frequency_hz: i64) -> Sample {
        Sample {
            frequency_hz,
            magnitude_db: None,
            vswr: None,
            phase_deg: None,
            phase_rad: None,
        }
    }
    pub fn with_magnitude_db(mut self, magnitude_db: f64) -> Sample {
        self.magnitude_db = Some(magnitude_db);
        self
    }
    pub fn with_vswr(mut self, vswr: f64) -> Sample {
        self.vswr = Some(vswr);
        self
    }
    /// Sets the phase in degrees, keeping the radian value consistent
    pub fn with_phase_deg(mut self, phase_deg: f64) -> Sample {
        self.phase_deg = Some(phase_deg);
        self.phase_rad = Some(phase_deg.to_radians());
        self
    }
}

/// The measurement columns a channel can carry besides frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Magnitude,
    Vswr,
    Phase,
}
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Magnitude => write!(f, "magnitude"),
            Field::Vswr => write!(f, "vswr"),
            Field::Phase => write!(f, "phase"),
        }
    }
}

/// An ordered frequency sweep of one signal path, stored column-wise.
///
/// Frequencies are strictly ascending and the channel is never empty. Phase is kept in
/// degrees only; radians are always derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    frequency_hz: Vec<i64>,
    magnitude_db: Option<Vec<f64>>,
    vswr: Option<Vec<f64>>,
    phase_deg: Option<Vec<f64>>,
}
impl Channel {
    /// Creates a channel holding only a frequency axis.
    ///
    /// # Errors
    /// Will return `Err` if `frequency_hz` is empty or not strictly ascending.
    pub fn new(frequency_hz: Vec<i64>) -> Result<Channel> {
        if frequency_hz.is_empty() {
            Err(DatasetError::InvalidChannelShape(
                "channel has no samples".to_string(),
            ))?
        }
        if let Some((i, (a, b))) = frequency_hz
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| b <= a)
        {
            Err(DatasetError::InvalidChannelShape(format!(
                "frequencies must be strictly ascending, found {b} Hz after {a} Hz at index {}",
                i + 1
            )))?
        }
        Ok(Channel {
            frequency_hz,
            magnitude_db: None,
            vswr: None,
            phase_deg: None,
        })
    }

    /// Builds a channel from row samples. Every sample must carry the same set of fields.
    pub fn from_samples(samples: &[Sample]) -> Result<Channel> {
        let mut channel = Channel::new(samples.iter().map(|s| s.frequency_hz).collect())?;
        channel.magnitude_db = collect_field(samples, Field::Magnitude, |s| s.magnitude_db)?;
        channel.vswr = collect_field(samples, Field::Vswr, |s| s.vswr)?;
        channel.phase_deg = collect_field(samples, Field::Phase, |s| {
            s.phase_deg.or_else(|| s.phase_rad.map(f64::to_degrees))
        })?;
        Ok(channel)
    }

    pub fn with_magnitude_db(mut self, magnitude_db: Vec<f64>) -> Result<Channel> {
        self.check_len(Field::Magnitude, magnitude_db.len())?;
        self.magnitude_db = Some(magnitude_db);
        Ok(self)
    }

    pub fn with_vswr(mut self, vswr: Vec<f64>) -> Result<Channel> {
        self.check_len(Field::Vswr, vswr.len())?;
        self.vswr = Some(vswr);
        Ok(self)
    }

    pub fn with_phase_deg(mut self, phase_deg: Vec<f64>) -> Result<Channel> {
        self.check_len(Field::Phase, phase_deg.len())?;
        self.phase_deg = Some(phase_deg);
        Ok(self)
    }

    pub fn with_phase_rad(self, phase_rad: Vec<f64>) -> Result<Channel> {
        self.with_phase_deg(phase_rad.into_iter().map(f64::to_degrees).collect())
    }

    fn check_len(&self, field: Field, len: usize) -> Result<()> {
        if len != self.len() {
            Err(DatasetError::InvalidChannelShape(format!(
                "{field} column has {len} values but the channel has {} frequencies",
                self.len()
            )))?
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frequency_hz.len()
    }

    /// Always false for a constructed channel
    pub fn is_empty(&self) -> bool {
        self.frequency_hz.is_empty()
    }

    pub fn frequencies(&self) -> &[i64] {
        &self.frequency_hz
    }

    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Magnitude => self.magnitude_db.is_some(),
            Field::Vswr => self.vswr.is_some(),
            Field::Phase => self.phase_deg.is_some(),
        }
    }

    pub fn magnitude_db(&self) -> Result<&[f64]> {
        self.magnitude_db
            .as_deref()
            .ok_or_else(|| missing_field(Field::Magnitude))
    }

    pub fn vswr(&self) -> Result<&[f64]> {
        self.vswr.as_deref().ok_or_else(|| missing_field(Field::Vswr))
    }

    pub fn phase_deg(&self) -> Result<&[f64]> {
        self.phase_deg
            .as_deref()
            .ok_or_else(|| missing_field(Field::Phase))
    }

    pub fn phase_rad(&self) -> Result<Vec<f64>> {
        Ok(self.phase_deg()?.iter().map(|p| p.to_radians()).collect())
    }

    /// Row view of the channel
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.frequency_hz.iter().enumerate().map(|(i, &f)| Sample {
            frequency_hz: f,
            magnitude_db: self.magnitude_db.as_ref().map(|m| m[i]),
            vswr: self.vswr.as_ref().map(|v| v[i]),
            phase_deg: self.phase_deg.as_ref().map(|p| p[i]),
            phase_rad: self.phase_deg.as_ref().map(|p| p[i].to_radians()),
        })
    }

    /// Keeps only the samples at `indices`, which must be ascending.
    pub(crate) fn select(&self, indices: &[usize]) -> Result<Channel> {
        let pick = |column: &Vec<f64>| indices.iter().map(|&i| column[i]).collect::<Vec<_>>();
        let mut channel = Channel::new(indices.iter().map(|&i| self.frequency_hz[i]).collect())?;
        channel.magnitude_db = self.magnitude_db.as_ref().map(pick);
        channel.vswr = self.vswr.as_ref().map(pick);
        channel.phase_deg = self.phase_deg.as_ref().map(pick);
        Ok(channel)
    }

    /// Applies `f` to every column that is present and places the results on `frequency_hz`.
    pub(crate) fn map_columns<F>(&self, frequency_hz: Vec<i64>, mut f: F) -> Result<Channel>
    where
        F: FnMut(&[f64]) -> Vec<f64>,
    {
        let mut channel = Channel::new(frequency_hz)?;
        if let Some(m) = &self.magnitude_db {
            channel = channel.with_magnitude_db(f(m.as_slice()))?;
        }
        if let Some(v) = &self.vswr {
            channel = channel.with_vswr(f(v.as_slice()))?;
        }
        if let Some(p) = &self.phase_deg {
            channel = channel.with_phase_deg(f(p.as_slice()))?;
        }
        Ok(channel)
    }

    /// First index at which the frequency axes of `self` and `other` differ, if any.
    pub fn axis_mismatch(&self, other: &Channel) -> Option<usize> {
        if self.len() != other.len() {
            return Some(self.len().min(other.len()));
        }
        self.frequency_hz
            .iter()
            .zip(other.frequency_hz.iter())
            .position(|(a, b)| a != b)
    }
}

fn missing_field(field: Field) -> DatasetError {
    DatasetError::InvalidChannelShape(format!("channel has no {field} field"))
}

fn collect_field<F>(samples: &[Sample], field: Field, get: F) -> Result<Option<Vec<f64>>>
where
    F: Fn(&Sample) -> Option<f64>,
{
    let values: Vec<Option<f64>> = samples.iter().map(get).collect();
    let present = values.iter().filter(|v| v.is_some()).count();
    if present == 0 {
        Ok(None)
    } else if present == values.len() {
        Ok(Some(values.into_iter().flatten().collect()))
    } else {
        Err(DatasetError::InvalidChannelShape(format!(
            "{field} is present on only {present} of {} samples",
            values.len()
        )))
    }
}

/// Which receiver sub-array a channel belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayGroup {
    Main,
    Interferometer,
}
impl ArrayGroup {
    /// Tests whether a channel name denotes a member of this array
    pub fn contains(&self, name: &str) -> bool {
        match self {
            ArrayGroup::Main => name.starts_with('M') && name != COMBINED_MAIN_KEY,
            ArrayGroup::Interferometer => name.starts_with('I') && name != COMBINED_INTF_KEY,
        }
    }

    /// Name under which the composite of this array is reported
    pub fn combined_name(&self) -> &'static str {
        match self {
            ArrayGroup::Main => "M_all",
            ArrayGroup::Interferometer => "I_all",
        }
    }
}
impl fmt::Display for ArrayGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArrayGroup::Main => write!(f, "main array"),
            ArrayGroup::Interferometer => write!(f, "interferometer array"),
        }
    }
}

/// Named channels, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSet {
    channels: IndexMap<String, Channel>,
}
impl ChannelSet {
    pub fn new() -> ChannelSet {
        ChannelSet::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, channel: Channel) -> Option<Channel> {
        self.channels.insert(name.into(), channel)
    }

    pub fn remove(&mut self, name: &str) -> Option<Channel> {
        self.channels.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Channel)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Applies a fallible transform to every channel, producing a new set.
    pub fn try_map<F, E>(&self, mut f: F) -> std::result::Result<ChannelSet, E>
    where
        F: FnMut(&str, &Channel) -> std::result::Result<Channel, E>,
    {
        let mut out = ChannelSet::new();
        for (name, channel) in self.iter() {
            out.insert(name, f(name, channel)?);
        }
        Ok(out)
    }

    /// Name of the channel with the fewest samples, ties going to the smallest name.
    pub fn shortest(&self) -> Option<&str> {
        self.iter()
            .min_by(|(na, a), (nb, b)| a.len().cmp(&b.len()).then_with(|| na.cmp(nb)))
            .map(|(name, _)| name)
    }

    /// Name of the channel with the most samples, ties going to the smallest name.
    pub fn longest(&self) -> Option<&str> {
        self.iter()
            .min_by(|(na, a), (nb, b)| b.len().cmp(&a.len()).then_with(|| na.cmp(nb)))
            .map(|(name, _)| name)
    }
}
impl FromIterator<(String, Channel)> for ChannelSet {
    fn from_iter<T: IntoIterator<Item = (String, Channel)>>(iter: T) -> Self {
        ChannelSet {
            channels: iter.into_iter().collect(),
        }
    }
}
impl IntoIterator for ChannelSet {
    type Item = (String, Channel);
    type IntoIter = indexmap::map::IntoIter<String, Channel>;
    fn into_iter(self) -> Self::IntoIter {
        self.channels.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(freqs: &[i64]) -> Channel {
        Channel::new(freqs.to_vec()).unwrap()
    }

    #[test]
    fn rejects_unordered_frequencies() {
        assert!(matches!(
            Channel::new(vec![10, 30, 20]),
            Err(DatasetError::InvalidChannelShape(_))
        ));
        assert!(matches!(
            Channel::new(vec![10, 10]),
            Err(DatasetError::InvalidChannelShape(_))
        ));
        assert!(Channel::new(vec![]).is_err());
    }

    #[test]
    fn rejects_wrong_column_length() {
        assert!(channel(&[1, 2, 3]).with_magnitude_db(vec![0.0; 2]).is_err());
    }

    #[test]
    fn missing_phase_is_invalid_shape() {
        let c = channel(&[1, 2]).with_magnitude_db(vec![0.0, 0.0]).unwrap();
        assert!(matches!(
            c.phase_deg(),
            Err(DatasetError::InvalidChannelShape(_))
        ));
    }

    #[test]
    fn samples_round_trip_keeps_radians_consistent() {
        let samples = vec![
            Sample::new(8_000_000).with_magnitude_db(-1.0).with_phase_deg(90.0),
            Sample::new(8_030_000).with_magnitude_db(-2.0).with_phase_deg(-45.0),
        ];
        let c = Channel::from_samples(&samples).unwrap();
        let back: Vec<Sample> = c.samples().collect();
        assert_eq!(back[0].phase_rad, Some(std::f64::consts::FRAC_PI_2));
        assert_eq!(back[1].magnitude_db, Some(-2.0));
        assert_eq!(back[1].vswr, None);
    }

    #[test]
    fn partial_fields_are_rejected() {
        let samples = vec![
            Sample::new(1).with_phase_deg(0.0),
            Sample::new(2),
        ];
        assert!(Channel::from_samples(&samples).is_err());
    }

    #[test]
    fn group_membership() {
        assert!(ArrayGroup::Main.contains("M0"));
        assert!(!ArrayGroup::Main.contains(COMBINED_MAIN_KEY));
        assert!(!ArrayGroup::Main.contains("I3"));
        assert!(ArrayGroup::Interferometer.contains("I3"));
        assert!(!ArrayGroup::Interferometer.contains(COMBINED_INTF_KEY));
    }

    #[test]
    fn reference_policy_breaks_ties_by_name() {
        let mut set = ChannelSet::new();
        set.insert("M2", channel(&[1, 2]));
        set.insert("M1", channel(&[1, 2]));
        set.insert("M0", channel(&[1, 2, 3, 4]));
        assert_eq!(set.shortest(), Some("M1"));
        assert_eq!(set.longest(), Some("M0"));
    }
}
