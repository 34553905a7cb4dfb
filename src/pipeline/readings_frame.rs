use crate::error::IrcelineError;
use crate::types::aggregation::AggregationFunction;
use crate::types::pollutant::Pollutant;
use crate::types::reading::{CityAggregate, CityTimeAggregate, Reading, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Readings as a lazy polars frame.
///
/// Columns: `city`, `station_id`, `lat`, `lon`, `pollutant` (lowercase name),
/// `timestamp` (`YYYY-MM-DD HH:MM:SS`, UTC) and `value`.
#[derive(Clone)]
pub struct ReadingsFrame {
    pub frame: LazyFrame,
}

impl ReadingsFrame {
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    pub fn from_readings(readings: &[Reading]) -> Result<Self, IrcelineError> {
        let df = df!(
            "city" => readings.iter().map(|r| r.city.as_str()).collect::<Vec<_>>(),
            "station_id" => readings.iter().map(|r| r.station_id.as_str()).collect::<Vec<_>>(),
            "lat" => readings.iter().map(|r| r.lat).collect::<Vec<_>>(),
            "lon" => readings.iter().map(|r| r.lon).collect::<Vec<_>>(),
            "pollutant" => readings.iter().map(|r| r.pollutant.name()).collect::<Vec<_>>(),
            "timestamp" => readings.iter().map(|r| r.timestamp_string()).collect::<Vec<_>>(),
            "value" => readings.iter().map(|r| r.value).collect::<Vec<_>>(),
        )?;
        Ok(Self::new(df.lazy()))
    }

    pub fn filter(&self, predicate: Expr) -> ReadingsFrame {
        ReadingsFrame::new(self.frame.clone().filter(predicate))
    }

    pub fn for_pollutant(&self, pollutant: Pollutant) -> ReadingsFrame {
        self.filter(col("pollutant").eq(lit(pollutant.name())))
    }

    pub fn for_city(&self, city: &str) -> ReadingsFrame {
        self.filter(col("city").eq(lit(city)))
    }

    /// Rolls `pollutant` up per city, highest value first, keeping at most `top_n` cities.
    ///
    /// Ties on value are ordered by city name.
    pub fn city_aggregates(
        &self,
        pollutant: Pollutant,
        aggregation: AggregationFunction,
        top_n: usize,
    ) -> Result<Vec<CityAggregate>, IrcelineError> {
        let limit = IdxSize::try_from(top_n).unwrap_or(IdxSize::MAX);
        let df = self
            .for_pollutant(pollutant)
            .frame
            .group_by([col("city")])
            .agg([
                aggregation.expr("value").alias("value"),
                col("lat").mean().alias("lat_mean"),
                col("lon").mean().alias("lon_mean"),
                col("station_id")
                    .n_unique()
                    .cast(DataType::Int64)
                    .alias("nb_stations"),
            ])
            .sort(
                ["value", "city"],
                SortMultipleOptions::default()
                    .with_order_descending_multi([true, false])
                    .with_nulls_last(true),
            )
            .limit(limit)
            .collect()?;

        let city = column(&df, "city")?.str()?;
        let value = column(&df, "value")?.f64()?;
        let lat_mean = column(&df, "lat_mean")?.f64()?;
        let lon_mean = column(&df, "lon_mean")?.f64()?;
        let nb_stations = column(&df, "nb_stations")?.i64()?;

        let mut aggregates = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let (Some(city), Some(value)) = (city.get(i), value.get(i)) else {
                continue;
            };
            aggregates.push(CityAggregate {
                city: city.to_string(),
                value,
                lat_mean: lat_mean.get(i).unwrap_or(f64::NAN),
                lon_mean: lon_mean.get(i).unwrap_or(f64::NAN),
                nb_stations: station_count(nb_stations.get(i))?,
            });
        }
        Ok(aggregates)
    }

    /// Rolls up one city's readings per pollutant and timestamp, in time order.
    pub fn city_time_aggregates(
        &self,
        city: &str,
        aggregation: AggregationFunction,
    ) -> Result<Vec<CityTimeAggregate>, IrcelineError> {
        let df = self
            .for_city(city)
            .frame
            .group_by([col("city"), col("pollutant"), col("timestamp")])
            .agg([
                aggregation.expr("value").alias("value"),
                col("station_id")
                    .n_unique()
                    .cast(DataType::Int64)
                    .alias("nb_stations"),
            ])
            .sort(["pollutant", "timestamp"], SortMultipleOptions::default())
            .collect()?;

        let city = column(&df, "city")?.str()?;
        let pollutant = column(&df, "pollutant")?.str()?;
        let timestamp = column(&df, "timestamp")?.str()?;
        let value = column(&df, "value")?.f64()?;
        let nb_stations = column(&df, "nb_stations")?.i64()?;

        let mut aggregates = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let (Some(city), Some(pollutant), Some(timestamp), Some(value)) = (
                city.get(i),
                pollutant.get(i),
                timestamp.get(i),
                value.get(i),
            ) else {
                continue;
            };
            let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
                .map_err(|e| IrcelineError::UnexpectedData(format!("timestamp '{timestamp}': {e}")))?;
            aggregates.push(CityTimeAggregate {
                city: city.to_string(),
                pollutant: pollutant.parse()?,
                timestamp,
                value,
                nb_stations: station_count(nb_stations.get(i))?,
            });
        }
        Ok(aggregates)
    }
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, IrcelineError> {
    df.column(name)
        .map_err(|_| IrcelineError::ColumnNotFound(name.to_string()))
}

fn station_count(count: Option<i64>) -> Result<u32, IrcelineError> {
    count
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| IrcelineError::UnexpectedData(format!("station count {count:?}")))
}

/// Per-city rollup of one pollutant, sorted by value descending, at most `top_n` rows.
///
/// Cities without readings of `pollutant` are absent from the result.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use irceline::{aggregate_by_city, AggregationFunction, Pollutant, Reading};
///
/// let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let reading = |city: &str, station: &str, value: f64| Reading {
///     city: city.to_string(),
///     station_id: station.to_string(),
///     lat: 51.0,
///     lon: 4.0,
///     pollutant: Pollutant::No2,
///     timestamp: at,
///     value,
/// };
/// let readings = [reading("Gent", "1", 20.0), reading("Gent", "2", 30.0), reading("Antwerpen", "3", 50.0)];
///
/// let top = aggregate_by_city(&readings, Pollutant::No2, AggregationFunction::Mean, 10).unwrap();
/// assert_eq!(top[0].city, "Antwerpen");
/// assert_eq!(top[1].value, 25.0);
/// assert_eq!(top[1].nb_stations, 2);
/// ```
pub fn aggregate_by_city(
    readings: &[Reading],
    pollutant: Pollutant,
    aggregation: AggregationFunction,
    top_n: usize,
) -> Result<Vec<CityAggregate>, IrcelineError> {
    ReadingsFrame::from_readings(readings)?.city_aggregates(pollutant, aggregation, top_n)
}

/// Rollup of one city's readings per pollutant and timestamp.
pub fn aggregate_by_city_time(
    readings: &[Reading],
    city: &str,
    aggregation: AggregationFunction,
) -> Result<Vec<CityTimeAggregate>, IrcelineError> {
    ReadingsFrame::from_readings(readings)?.city_time_aggregates(city, aggregation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reading(
        city: &str,
        station_id: &str,
        pollutant: Pollutant,
        hour: u32,
        value: f64,
    ) -> Reading {
        Reading {
            city: city.to_string(),
            station_id: station_id.to_string(),
            lat: 51.0 + station_id.len() as f64 / 10.0,
            lon: 4.0,
            pollutant,
            timestamp: at(hour),
            value,
        }
    }

    fn sample() -> Vec<Reading> {
        vec![
            reading("Gent", "g1", Pollutant::No2, 0, 20.0),
            reading("Gent", "g1", Pollutant::No2, 1, 30.0),
            reading("Gent", "g22", Pollutant::No2, 0, 40.0),
            reading("Gent", "g1", Pollutant::Pm10, 0, 11.0),
            reading("Antwerpen", "a1", Pollutant::No2, 0, 10.0),
            reading("Brugge", "b1", Pollutant::Pm10, 0, 8.0),
            reading("Leuven", "l1", Pollutant::No2, 0, 30.0),
        ]
    }

    #[test]
    fn test_city_mean_and_station_count() {
        let rows =
            aggregate_by_city(&sample(), Pollutant::No2, AggregationFunction::Mean, 10).unwrap();

        let cities: Vec<&str> = rows.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Gent", "Leuven", "Antwerpen"]);
        assert_eq!(rows[0].value, 30.0);
        assert_eq!(rows[0].nb_stations, 2);
        assert!((rows[0].lat_mean - (51.2 + 51.2 + 51.3) / 3.0).abs() < 1e-9);
        assert_eq!(rows[0].lon_mean, 4.0);
    }

    #[test]
    fn test_ordering_by_value_then_city() {
        // Gent and Leuven share a mean of 30.0.
        let rows =
            aggregate_by_city(&sample(), Pollutant::No2, AggregationFunction::Mean, 10).unwrap();
        assert_eq!(rows[0].value, rows[1].value);
        assert_eq!(rows[0].city, "Gent");

        let rows =
            aggregate_by_city(&sample(), Pollutant::No2, AggregationFunction::Min, 10).unwrap();
        let cities: Vec<&str> = rows.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Leuven", "Gent", "Antwerpen"]);
    }

    #[test]
    fn test_top_n_limits_rows() {
        let rows =
            aggregate_by_city(&sample(), Pollutant::No2, AggregationFunction::Sum, 2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].city, "Gent");
        assert_eq!(rows[0].value, 90.0);

        let none =
            aggregate_by_city(&sample(), Pollutant::No2, AggregationFunction::Sum, 0).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_missing_pollutant_yields_no_rows() {
        let rows =
            aggregate_by_city(&sample(), Pollutant::So2, AggregationFunction::Mean, 10).unwrap();
        assert!(rows.is_empty());

        let rows = aggregate_by_city(&[], Pollutant::No2, AggregationFunction::Mean, 10).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_city_absent_without_matching_readings() {
        let rows =
            aggregate_by_city(&sample(), Pollutant::Pm10, AggregationFunction::Mean, 10).unwrap();
        let cities: Vec<&str> = rows.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Gent", "Brugge"]);
    }

    #[test]
    fn test_city_time_rollup() {
        let rows =
            aggregate_by_city_time(&sample(), "Gent", AggregationFunction::Mean).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].pollutant, Pollutant::No2);
        assert_eq!(rows[0].timestamp, at(0));
        assert_eq!(rows[0].value, 30.0);
        assert_eq!(rows[0].nb_stations, 2);
        assert_eq!(rows[1].timestamp, at(1));
        assert_eq!(rows[1].nb_stations, 1);
        assert_eq!(rows[2].pollutant, Pollutant::Pm10);
        assert!(rows.iter().all(|r| r.city == "Gent"));
    }

    #[test]
    fn test_city_time_rollup_unknown_city() {
        let rows =
            aggregate_by_city_time(&sample(), "Namur", AggregationFunction::Mean).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_frame_filter_composes() {
        let frame = ReadingsFrame::from_readings(&sample()).unwrap();
        let df = frame
            .for_city("Gent")
            .filter(col("value").gt(lit(25.0)))
            .frame
            .collect()
            .unwrap();
        assert_eq!(df.height(), 2);
    }
}
