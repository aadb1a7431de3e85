//! Compile-time–checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    PasswordSalt,
    IsActive,
    EmailConfirmToken,
    PasswordResetToken,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum Namespaces {
    Table,
    Id,
    Title,
    Description,
    OwnerId,
    HexColor,
    IsArchived,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum Lists {
    Table,
    Id,
    Title,
    Description,
    Identifier,
    HexColor,
    OwnerId,
    NamespaceId,
    IsArchived,
    IsFavorite,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum Tasks {
    Table,
    Id,
    Title,
    Description,
    Done,
    DoneAt,
    DueDate,
    Priority,
    ListId,
    BucketId,
    IsFavorite,
    CreatedById,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum TaskAssignees {
    Table,
    Id,
    TaskId,
    UserId,
    Created,
}

#[derive(Iden)]
pub enum Buckets {
    Table,
    Id,
    Title,
    ListId,
    CreatedById,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum Teams {
    Table,
    Id,
    Name,
    Description,
    CreatedById,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum TeamMembers {
    Table,
    Id,
    TeamId,
    UserId,
    Admin,
    Created,
}

#[derive(Iden)]
pub enum TeamNamespaces {
    Table,
    Id,
    TeamId,
    NamespaceId,
    Right,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum TeamLists {
    Table,
    Id,
    TeamId,
    ListId,
    Right,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum UsersNamespaces {
    Table,
    Id,
    UserId,
    NamespaceId,
    Right,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum UsersLists {
    Table,
    Id,
    UserId,
    ListId,
    Right,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum LinkShares {
    Table,
    Id,
    Hash,
    ListId,
    Right,
    SharingType,
    SharedById,
    Created,
    Updated,
}

#[derive(Iden)]
pub enum SavedFilters {
    Table,
    Id,
    Title,
    Description,
    Filters,
    OwnerId,
    IsFavorite,
    Created,
    Updated,
}
