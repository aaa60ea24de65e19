//! Access to the external data a run consumes: weather by climate zone, hot water load profiles
//! by household, and performance parameters by component kind.
use crate::core::component::{ComponentKind, ComponentParameters};
use crate::core::water_heat_demand::load_profile::{HouseholdLoad, LoadProfile, LoadProfileGenerator};
use crate::input::{KeyString, Project};
use crate::irradiation::CollectorOrientation;
use crate::read_weather_file::{weather_data_to_vec, WeatherFileError};
use crate::sizing::SizingRules;
use crate::weather::{ClimateZone, WeatherSeries};
use csv::ReaderBuilder as CsvReaderBuilder;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No weather data is available for climate zone {0}")]
    UnknownClimateZone(ClimateZone),
    #[error("No load profile is available for household '{0}'")]
    UnknownLoadProfile(String),
    #[error("No performance parameters are available for component {0}")]
    UnknownComponent(ComponentKind),
    #[error("Could not open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    WeatherFile(#[from] WeatherFileError),
    #[error("Load profile could not be read: {0}")]
    LoadProfile(#[from] csv::Error),
    #[error("Component parameters could not be read: {0}")]
    ComponentParameters(#[from] serde_json::Error),
}

/// Read-only source of external run data, shared between concurrent runs.
pub trait ParameterStore: Sync {
    /// Hourly weather for the zone with irradiance on the given collector plane.
    fn get_weather(
        &self,
        zone: ClimateZone,
        orientation: &CollectorOrientation,
    ) -> Result<WeatherSeries, StoreError>;

    /// Loads for every household in the project; `request` drives any generated profiles.
    fn get_load_profile(
        &self,
        project: &Project,
        request: &LoadRequest,
    ) -> Result<LoadProfile, StoreError>;

    fn get_component_params(&self, kind: ComponentKind)
        -> Result<ComponentParameters, StoreError>;
}

/// Settings of one run that shape the load profiles generated for it.
#[derive(Clone, Copy, Debug)]
pub struct LoadRequest<'a> {
    pub seed: u64,
    /// hourly steps in the simulated year
    pub hours: usize,
    /// source of the design daily demand per occupancy
    pub rules: &'a SizingRules,
}

impl LoadRequest<'_> {
    /// Generate a load profile for a household no profile is held for.
    fn generate(&self, project: &Project, index: usize) -> HouseholdLoad {
        let household = &project.households[index];
        debug!("generating load profile for household {}", household.id);
        LoadProfileGenerator::new(self.seed, self.hours).household(
            household,
            index,
            self.rules.demand_estimate(household.occupancy),
        )
    }
}

/// Store holding all data in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    weather: IndexMap<ClimateZone, WeatherSeries>,
    loads: IndexMap<KeyString, Vec<f64>>,
    components: IndexMap<ComponentKind, ComponentParameters>,
    generate_missing_loads: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add weather already resolved onto the collector plane; the orientation requested from
    /// the store is not applied to it.
    pub fn with_weather(mut self, weather: WeatherSeries) -> Self {
        self.weather.insert(weather.climate_zone, weather);
        self
    }

    pub fn with_household_load(mut self, id: impl Into<KeyString>, hourly_draw: Vec<f64>) -> Self {
        self.loads.insert(id.into(), hourly_draw);
        self
    }

    pub fn with_component_params(
        mut self,
        kind: ComponentKind,
        params: ComponentParameters,
    ) -> Self {
        self.components.insert(kind, params);
        self
    }

    /// Use the built-in parameters for every component kind not otherwise provided.
    pub fn with_default_components(mut self) -> Self {
        use strum::IntoEnumIterator;
        for kind in ComponentKind::iter() {
            self.components
                .entry(kind)
                .or_insert_with(|| kind.default_parameters());
        }
        self
    }

    /// Generate loads for households with no stored profile.
    pub fn with_generated_loads(mut self) -> Self {
        self.generate_missing_loads = true;
        self
    }
}

impl ParameterStore for InMemoryStore {
    fn get_weather(
        &self,
        zone: ClimateZone,
        _orientation: &CollectorOrientation,
    ) -> Result<WeatherSeries, StoreError> {
        self.weather
            .get(&zone)
            .cloned()
            .ok_or(StoreError::UnknownClimateZone(zone))
    }

    fn get_load_profile(
        &self,
        project: &Project,
        request: &LoadRequest,
    ) -> Result<LoadProfile, StoreError> {
        let households = project
            .households
            .iter()
            .enumerate()
            .map(|(index, household)| match self.loads.get(&household.id) {
                Some(hourly_draw) => Ok(HouseholdLoad {
                    id: household.id.clone(),
                    occupancy: household.occupancy,
                    hourly_draw: hourly_draw.clone(),
                }),
                None if self.generate_missing_loads => Ok(request.generate(project, index)),
                None => Err(StoreError::UnknownLoadProfile(household.id.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LoadProfile::new(households))
    }

    fn get_component_params(
        &self,
        kind: ComponentKind,
    ) -> Result<ComponentParameters, StoreError> {
        self.components
            .get(&kind)
            .cloned()
            .ok_or(StoreError::UnknownComponent(kind))
    }
}

/// Store reading from a data directory laid out as:
///
/// * `weather/CZ01.csv` .. `weather/CZ16.csv` - weather files
/// * `loads/<household id>.csv`, else `loads/occupancy_<n>.csv` - single column of hourly draw
///   in m3, headed `draw_m3`
/// * `components.json` - performance parameters by component kind; when absent the built-in
///   parameters are used
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    components: Option<IndexMap<ComponentKind, ComponentParameters>>,
    generate_missing_loads: bool,
}

fn open(path: &Path) -> Result<BufReader<File>, StoreError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn read_hourly_draw(file: impl Read) -> Result<Vec<f64>, csv::Error> {
    let mut reader = CsvReaderBuilder::new().has_headers(true).from_reader(file);
    reader.deserialize::<f64>().collect()
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let components_path = root.join("components.json");
        let components = if components_path.exists() {
            Some(serde_json::from_reader(open(&components_path)?)?)
        } else {
            None
        };

        Ok(Self {
            root,
            components,
            generate_missing_loads: false,
        })
    }

    /// Generate loads for households with no profile file.
    pub fn with_generated_loads(mut self) -> Self {
        self.generate_missing_loads = true;
        self
    }

    fn load_file(&self, project: &Project, index: usize) -> Option<PathBuf> {
        let household = &project.households[index];
        [
            format!("{}.csv", household.id),
            format!("occupancy_{}.csv", household.occupancy),
        ]
        .into_iter()
        .map(|name| self.root.join("loads").join(name))
        .find(|path| path.exists())
    }
}

impl ParameterStore for DirectoryStore {
    fn get_weather(
        &self,
        zone: ClimateZone,
        orientation: &CollectorOrientation,
    ) -> Result<WeatherSeries, StoreError> {
        let path = self.root.join("weather").join(format!("{zone}.csv"));
        if !path.exists() {
            return Err(StoreError::UnknownClimateZone(zone));
        }
        let weather_file = weather_data_to_vec(open(&path)?)?;

        Ok(weather_file.into_series(orientation)?)
    }

    fn get_load_profile(
        &self,
        project: &Project,
        request: &LoadRequest,
    ) -> Result<LoadProfile, StoreError> {
        let mut households = Vec::with_capacity(project.households.len());
        for (index, household) in project.households.iter().enumerate() {
            let load = match self.load_file(project, index) {
                Some(path) => HouseholdLoad {
                    id: household.id.clone(),
                    occupancy: household.occupancy,
                    hourly_draw: read_hourly_draw(open(&path)?)?,
                },
                None if self.generate_missing_loads => request.generate(project, index),
                None => return Err(StoreError::UnknownLoadProfile(household.id.to_string())),
            };
            households.push(load);
        }

        Ok(LoadProfile::new(households))
    }

    fn get_component_params(
        &self,
        kind: ComponentKind,
    ) -> Result<ComponentParameters, StoreError> {
        match &self.components {
            Some(components) => components
                .get(&kind)
                .cloned()
                .ok_or(StoreError::UnknownComponent(kind)),
            None => Ok(kind.default_parameters()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{CommunityLayout, Household};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn project() -> Project {
        Project {
            climate_zone: "CZ12".parse().unwrap(),
            households: vec![
                Household {
                    id: "stored".into(),
                    occupancy: 2,
                    at_home: false,
                },
                Household {
                    id: "generated".into(),
                    occupancy: 4,
                    at_home: true,
                },
            ],
            scale: 1.,
            layout: CommunityLayout::Attached,
        }
    }

    fn rules() -> SizingRules {
        Default::default()
    }

    fn request(seed: u64, hours: usize, rules: &SizingRules) -> LoadRequest<'_> {
        LoadRequest { seed, hours, rules }
    }

    #[rstest]
    fn should_report_missing_data(project: Project) {
        let store = InMemoryStore::new().with_household_load("stored", vec![0.01; 24]);
        assert!(matches!(
            store.get_weather(project.climate_zone, &Default::default()),
            Err(StoreError::UnknownClimateZone(_))
        ));
        assert!(matches!(
            store.get_load_profile(&project, &request(7, 24, &rules())),
            Err(StoreError::UnknownLoadProfile(id)) if id == "generated"
        ));
        assert!(matches!(
            store.get_component_params(ComponentKind::HeatPump),
            Err(StoreError::UnknownComponent(ComponentKind::HeatPump))
        ));
    }

    #[rstest]
    fn should_combine_stored_and_generated_loads(project: Project) {
        let store = InMemoryStore::new()
            .with_household_load("stored", vec![0.01; 24])
            .with_generated_loads();
        let profile = store
            .get_load_profile(&project, &request(7, 24, &rules()))
            .unwrap();
        assert_eq!(profile.len(), 24);
        assert_eq!(profile.households()[0].hourly_draw, vec![0.01; 24]);
        assert!(profile.households()[1].annual_draw() > 0.);
    }

    #[rstest]
    fn generated_loads_should_follow_request_seed_and_length(project: Project) {
        let store = InMemoryStore::new().with_generated_loads();
        let rules = rules();

        let first = store.get_load_profile(&project, &request(7, 48, &rules)).unwrap();
        let again = store.get_load_profile(&project, &request(7, 48, &rules)).unwrap();
        let reseeded = store.get_load_profile(&project, &request(8, 48, &rules)).unwrap();
        let shorter = store.get_load_profile(&project, &request(7, 24, &rules)).unwrap();

        assert_eq!(first.len(), 48);
        assert_eq!(shorter.len(), 24);
        assert_eq!(first.households(), again.households());
        assert!(first.households()[0].hourly_draw != reseeded.households()[0].hourly_draw);
    }

    #[rstest]
    fn generated_loads_should_scale_with_configured_demand(project: Project) {
        let store = InMemoryStore::new().with_generated_loads();
        let defaults = rules();
        let mut doubled = rules();
        doubled.demand_one_occupant *= 2.;
        doubled.demand_two_occupants *= 2.;
        doubled.demand_per_additional_occupant *= 2.;

        let base = store
            .get_load_profile(&project, &request(7, 24, &defaults))
            .unwrap();
        let scaled = store
            .get_load_profile(&project, &request(7, 24, &doubled))
            .unwrap();

        for (base, scaled) in base.households().iter().zip(scaled.households()) {
            assert_relative_eq!(
                scaled.annual_draw(),
                2. * base.annual_draw(),
                max_relative = 1e-12
            );
        }
    }

    #[rstest]
    fn should_prefer_provided_component_params() {
        let mut params = ComponentParameters::default();
        params.insert("efficiency", 0.5);
        let store = InMemoryStore::new()
            .with_component_params(ComponentKind::SolarPump, params.clone())
            .with_default_components();
        assert_eq!(
            store.get_component_params(ComponentKind::SolarPump).unwrap(),
            params
        );
        assert_eq!(
            store.get_component_params(ComponentKind::Piping).unwrap(),
            ComponentKind::Piping.default_parameters()
        );
    }

    #[rstest]
    fn should_read_hourly_draw_column() {
        let draw = read_hourly_draw("draw_m3\n0.01\n0.0\n0.02\n".as_bytes()).unwrap();
        assert_eq!(draw, vec![0.01, 0., 0.02]);
    }

    #[rstest]
    fn should_report_unknown_zone_for_empty_directory(project: Project) {
        let store = DirectoryStore::new(std::env::temp_dir().join("swh-no-such-data-dir")).unwrap();
        assert!(matches!(
            store.get_weather(project.climate_zone, &Default::default()),
            Err(StoreError::UnknownClimateZone(_))
        ));
        assert_eq!(
            store.get_component_params(ComponentKind::GasTank).unwrap(),
            ComponentKind::GasTank.default_parameters()
        );
    }
}
