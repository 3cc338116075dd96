//! SeaORM entity models
//!
//! Database entities for CopyVault and the EcoVerse challenge catalog

mod user;
mod category;
mod copy;
mod like;
mod challenge;
mod submission;

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
    Role,
};

pub use category::{
    Entity as CategoryEntity,
    Model as Category,
    ActiveModel as CategoryActiveModel,
    Column as CategoryColumn,
};

pub use copy::{
    Entity as CopyEntity,
    Model as Copy,
    ActiveModel as CopyActiveModel,
    Column as CopyColumn,
    Tags,
};

pub use like::{
    Entity as LikeEntity,
    Model as Like,
    ActiveModel as LikeActiveModel,
    Column as LikeColumn,
};

pub use challenge::{
    Entity as ChallengeEntity,
    Model as Challenge,
    ActiveModel as ChallengeActiveModel,
    Column as ChallengeColumn,
};

pub use submission::{
    Entity as SubmissionEntity,
    Model as Submission,
    ActiveModel as SubmissionActiveModel,
    Column as SubmissionColumn,
    SubmissionStatus,
};
