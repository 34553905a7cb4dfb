//! Prints the most polluted cities of Flanders and Brussels for the last week.
//!
//! Usage: `cargo run --example top_cities -- [pollutant] [aggregation]`

use chrono::{Duration, Utc};
use irceline::{AggregationFunction, Irceline, IrcelineError, Pollutant, TimeSpan};
use std::env;

#[tokio::main]
async fn main() -> Result<(), IrcelineError> {
    let mut args = env::args().skip(1);
    let pollutant: Pollutant = args.next().as_deref().unwrap_or("no2").parse()?;
    let aggregation: AggregationFunction = args.next().as_deref().unwrap_or("mean").parse()?;

    let end = Utc::now();
    let span = TimeSpan::new(end - Duration::days(7), end)?;

    let client = Irceline::new().await?;
    let top = client
        .top_polluted_cities()
        .span(span)
        .pollutant(pollutant)
        .aggregation(aggregation)
        .call()
        .await?;

    println!("{} of {} over {}", aggregation, pollutant, span);
    for (rank, city) in top.iter().enumerate() {
        println!(
            "{:>2}. {:<20} {:>8.2}  ({} stations, {:.4}, {:.4})",
            rank + 1,
            city.city,
            city.value,
            city.nb_stations,
            city.lat_mean,
            city.lon_mean
        );
    }

    let cities = client.cities().await?;
    println!("\n{} cities have stations in the region", cities.len());

    Ok(())
}
