//! Delegated access to a bank account.

use sea_orm::entity::prelude::*;

use crate::util::stored_enum;

stored_enum! {
    pub enum DelegateRole("bank delegate role") {
        /// Deposit, withdraw, transfer and read the statement.
        Manager => "manager",
        /// Deposit and read the statement.
        Depositor => "depositor",
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_delegates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_number: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bank_accounts::Entity",
        from = "Column::AccountNumber",
        to = "super::bank_accounts::Column::AccountNumber",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    BankAccounts,
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
