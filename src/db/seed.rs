//! Sample clinic data
//!
//! Loads a small, fixed data set (10 owners, 6 veterinarians, 8 pets and
//! 4 visits) or wipes every collection. Used by the `seed` binary and by
//! tests that want a realistic clinic.

use chrono::{DateTime, Months, NaiveDate, Utc};

use super::Repositories;
use crate::error::{Error, Result};
use crate::logging::Timer;
use crate::models::{
    NewOwner, NewPet, NewVeterinarian, NewVisit, Owner, Pet, Species, Veterinarian, Visit,
};

const OWNERS: [(&str, &str, &str, &str, &str); 10] = [
    ("George", "Franklin", "110 W. Liberty St.", "Madison", "6085551023"),
    ("Betty", "Davis", "638 Cardinal Ave.", "Sun Prairie", "6085551749"),
    ("Eduardo", "Rodriguez", "2693 Commerce St.", "McFarland", "6085558763"),
    ("Harold", "Davis", "563 Friendly St.", "Windsor", "6085553198"),
    ("Peter", "McTavish", "2387 S. Fair Way", "Madison", "6085552765"),
    ("Jean", "Coleman", "105 N. Lake St.", "Monona", "6085552654"),
    ("Jeff", "Black", "1450 Oak Blvd.", "Monona", "6085555387"),
    ("Maria", "Escobito", "345 Maple St.", "Madison", "6085557683"),
    ("David", "Schroeder", "2749 Blackhawk Trail", "Madison", "6085559435"),
    ("Carlos", "Estaban", "2335 Independence La.", "Waunakee", "6085555487"),
];

const VETERINARIANS: [(&str, &str, &[&str]); 6] = [
    ("James", "Carter", &[]),
    ("Linda", "Douglas", &["dentistry", "surgery"]),
    ("Sharon", "Jenkins", &[]),
    ("Helen", "Leary", &["radiology"]),
    ("Rafael", "Ortega", &["surgery"]),
    ("Henry", "Stevens", &["radiology"]),
];

/// (name, species, age, birth date, index into OWNERS)
const PETS: [(&str, Species, Option<i32>, Option<&str>, usize); 8] = [
    ("Leo", Species::Dog, Some(3), None, 0),
    ("Basil", Species::Cat, Some(2), None, 1),
    ("Jewel", Species::Bird, Some(1), None, 2),
    ("Iggy", Species::Reptile, Some(2), None, 3),
    ("George", Species::Reptile, Some(5), None, 4),
    ("Max", Species::Cat, Some(1), None, 5),
    ("Lucky", Species::Dog, None, Some("2010-06-24"), 9),
    ("Sly", Species::Cat, None, Some("2012-06-08"), 9),
];

/// Number of records written by [`import_data`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub owners: usize,
    pub veterinarians: usize,
    pub pets: usize,
    pub visits: usize,
}

/// Remove every record from every collection
pub async fn destroy_data(repos: &Repositories) -> Result<()> {
    let visits = repos.visits.clear().await?;
    let pets = repos.pets.clear().await?;
    let veterinarians = repos.veterinarians.clear().await?;
    let owners = repos.owners.clear().await?;

    tracing::info!(owners, pets, veterinarians, visits, "Clinic data destroyed");
    Ok(())
}

fn day(value: &str) -> Result<DateTime<Utc>> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::internal(format!("Invalid seed date: {}", value)))
}

fn months_before(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months)).unwrap_or(now)
}

/// Replace all data with the sample clinic; visits are dated relative to `now`
pub async fn import_data(repos: &Repositories, now: DateTime<Utc>) -> Result<SeedReport> {
    let timer = Timer::start("import_data");
    destroy_data(repos).await?;

    let vets: Vec<Veterinarian> = VETERINARIANS
        .iter()
        .map(|(first, last, specialties)| {
            Veterinarian::create(NewVeterinarian {
                first_name: first.to_string(),
                last_name: last.to_string(),
                specialties: specialties.iter().map(|s| s.to_string()).collect(),
            })
        })
        .collect();
    for vet in &vets {
        repos.veterinarians.insert(vet).await?;
    }
    tracing::info!(count = vets.len(), "Veterinarians inserted");

    let owners: Vec<Owner> = OWNERS
        .iter()
        .map(|(first, last, address, city, telephone)| {
            Owner::create(NewOwner {
                first_name: first.to_string(),
                last_name: last.to_string(),
                address: address.to_string(),
                city: city.to_string(),
                telephone: telephone.to_string(),
            })
        })
        .collect();
    for owner in &owners {
        repos.owners.insert(owner).await?;
    }
    tracing::info!(count = owners.len(), "Owners inserted");

    let mut pets: Vec<Pet> = Vec::with_capacity(PETS.len());
    for (name, species, age, birth_date, owner) in PETS {
        pets.push(Pet::create(NewPet {
            name: name.to_string(),
            species,
            age,
            birth_date: birth_date.map(day).transpose()?,
            owner: owners[owner].id,
        }));
    }
    for pet in &pets {
        repos.pets.insert(pet).await?;
    }
    tracing::info!(count = pets.len(), "Pets inserted");

    // (months ago, description, index into pets, index into vets)
    let schedule = [
        (1, "Full check-up", 6, 0),
        (2, "Annual vaccination", 6, 1),
        (0, "Routine check-up", 0, 2),
        (0, "Respiratory problem", 1, 3),
    ];
    let visits: Vec<Visit> = schedule
        .iter()
        .map(|&(months, description, pet, vet)| {
            Visit::create(NewVisit {
                date: months_before(now, months),
                description: description.to_string(),
                pet: pets[pet].id,
                veterinarian: Some(vets[vet].id),
            })
        })
        .collect();
    for visit in &visits {
        repos.visits.insert(visit).await?;
    }
    tracing::info!(count = visits.len(), "Visits inserted");

    timer.stop_info();
    Ok(SeedReport {
        owners: owners.len(),
        veterinarians: vets.len(),
        pets: pets.len(),
        visits: visits.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;

    #[tokio::test]
    async fn test_import_then_destroy() {
        let repos = Repositories::in_memory(&InMemoryStore::new());

        let report = import_data(&repos, Utc::now()).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                owners: 10,
                veterinarians: 6,
                pets: 8,
                visits: 4
            }
        );
        assert_eq!(repos.pets.count().await.unwrap(), 8);

        let carlos_pets = repos
            .owners
            .find_all(Some("Estaban"))
            .await
            .unwrap()
            .pop()
            .unwrap();
        let pets = repos.pets.find_by_owner(carlos_pets.id).await.unwrap();
        let names: Vec<_> = pets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Lucky", "Sly"]);
        assert!(pets[0].birth_date.is_some());

        destroy_data(&repos).await.unwrap();
        assert_eq!(repos.owners.count().await.unwrap(), 0);
        assert_eq!(repos.visits.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_is_repeatable() {
        let repos = Repositories::in_memory(&InMemoryStore::new());
        import_data(&repos, Utc::now()).await.unwrap();
        import_data(&repos, Utc::now()).await.unwrap();
        assert_eq!(repos.owners.count().await.unwrap(), 10);
    }
}
