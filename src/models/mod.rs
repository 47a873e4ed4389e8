//! Data models for vetclinic
//!
//! This module contains the clinic records (owners, pets, veterinarians,
//! visits), the payloads clients send to create or update them, references
//! between records and the shared validation rules.

pub mod dashboard;
pub mod error;
pub mod id;
pub mod owner;
pub mod pet;
pub mod reference;
pub mod validation;
pub mod veterinarian;
pub mod visit;

// Re-export commonly used types
pub use dashboard::{DashboardSummary, DeleteOutcome, MonthlyBucket, MonthlyVisitReport};
pub use error::{FieldError, ValidationError, ValidationErrorKind, ValidationErrors};
pub use id::ObjectId;
pub use owner::{NewOwner, Owner, OwnerDetail, OwnerPatch, OwnerPayload, OwnerSummary};
pub use pet::{NewPet, Pet, PetDetail, PetPatch, PetPayload, PetSummary, Species};
pub use reference::{index_by_id, Identified, Ref};
pub use validation::is_valid_object_id;
pub use veterinarian::{
    NewVeterinarian, Veterinarian, VeterinarianPatch, VeterinarianPayload, VeterinarianSummary,
};
pub use visit::{CreatedVisit, NewVisit, Visit, VisitPatch, VisitPayload};
