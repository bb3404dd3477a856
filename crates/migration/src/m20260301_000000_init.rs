//! Initial schema migration - creates all tables from scratch.
//!
//! - `accounts`: user wallets, one balance column per currency
//! - `ledger_entries`: append-only wallet audit trail
//! - `loan_applications` / `loans`: peer-to-peer credit
//! - `institutions`, `bank_accounts`, `bank_delegates`, `bank_ledger_entries`:
//!   banking
//! - `businesses`, `investments`: profit-generating assets
//! - `listings`: marketplace
//!
//! Non-negative balances and the repayment bound are also enforced by CHECK
//! constraints.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    UserId,
    Gold,
    Silver,
    CreatedAt,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    AccountId,
    Kind,
    Amount,
    Currency,
    Description,
    CounterpartyId,
    CreatedAt,
}

#[derive(Iden)]
enum LoanApplications {
    Table,
    Id,
    BorrowerId,
    Amount,
    Currency,
    TermDays,
    DueDate,
    Purpose,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Loans {
    Table,
    Id,
    ApplicationId,
    LenderId,
    BorrowerId,
    Principal,
    Currency,
    DueDate,
    RepaidAmount,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Institutions {
    Table,
    Id,
    Name,
    OwnerId,
    LicenseCode,
    OffersProfitSharing,
    Active,
    CreatedAt,
}

#[derive(Iden)]
enum BankAccounts {
    Table,
    AccountNumber,
    InstitutionId,
    OwnerId,
    Kind,
    ProfitShareBps,
    Currency,
    Balance,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum BankDelegates {
    Table,
    AccountNumber,
    UserId,
    Role,
}

#[derive(Iden)]
enum BankLedgerEntries {
    Table,
    Id,
    AccountNumber,
    Kind,
    Amount,
    Currency,
    Description,
    CounterpartyAccount,
    ActorId,
    CreatedAt,
}

#[derive(Iden)]
enum Businesses {
    Table,
    Id,
    OwnerId,
    Kind,
    Cost,
    Currency,
    ProfitPerPeriod,
    Status,
    LastCollectedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Investments {
    Table,
    Id,
    InvestorId,
    BusinessId,
    Amount,
    Currency,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Listings {
    Table,
    Id,
    SellerId,
    Title,
    Price,
    Currency,
    Status,
    BuyerId,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Gold)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Accounts::Gold).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Accounts::Silver)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Accounts::Silver).gte(0)),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Ledger entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::AccountId).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Kind).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Amount).big_integer().not_null())
                    .col(ColumnDef::new(LedgerEntries::Currency).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Description).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::CounterpartyId).string())
                    .col(ColumnDef::new(LedgerEntries::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-account_id")
                            .from(LedgerEntries::Table, LedgerEntries::AccountId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-counterparty_id")
                            .from(LedgerEntries::Table, LedgerEntries::CounterpartyId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-account_id-created_at")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::AccountId)
                    .col(LedgerEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Loan applications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LoanApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoanApplications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LoanApplications::BorrowerId).string().not_null())
                    .col(
                        ColumnDef::new(LoanApplications::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(LoanApplications::Amount).gt(0)),
                    )
                    .col(ColumnDef::new(LoanApplications::Currency).string().not_null())
                    .col(ColumnDef::new(LoanApplications::TermDays).big_integer().not_null())
                    .col(ColumnDef::new(LoanApplications::DueDate).timestamp().not_null())
                    .col(ColumnDef::new(LoanApplications::Purpose).string())
                    .col(ColumnDef::new(LoanApplications::Status).string().not_null())
                    .col(ColumnDef::new(LoanApplications::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loan_applications-borrower_id")
                            .from(LoanApplications::Table, LoanApplications::BorrowerId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loan_applications-status")
                    .table(LoanApplications::Table)
                    .col(LoanApplications::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Loans
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Loans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Loans::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Loans::ApplicationId).integer().not_null())
                    .col(ColumnDef::new(Loans::LenderId).string().not_null())
                    .col(ColumnDef::new(Loans::BorrowerId).string().not_null())
                    .col(ColumnDef::new(Loans::Principal).big_integer().not_null())
                    .col(ColumnDef::new(Loans::Currency).string().not_null())
                    .col(ColumnDef::new(Loans::DueDate).timestamp().not_null())
                    .col(
                        ColumnDef::new(Loans::RepaidAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Loans::Status).string().not_null())
                    .col(ColumnDef::new(Loans::CreatedAt).timestamp().not_null())
                    .check(Expr::col(Loans::RepaidAmount).gte(0))
                    .check(Expr::col(Loans::RepaidAmount).lte(Expr::col(Loans::Principal)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loans-application_id")
                            .from(Loans::Table, Loans::ApplicationId)
                            .to(LoanApplications::Table, LoanApplications::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loans-lender_id")
                            .from(Loans::Table, Loans::LenderId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loans-borrower_id")
                            .from(Loans::Table, Loans::BorrowerId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loans-application_id-unique")
                    .table(Loans::Table)
                    .col(Loans::ApplicationId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loans-status-due_date")
                    .table(Loans::Table)
                    .col(Loans::Status)
                    .col(Loans::DueDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Institutions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Institutions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Institutions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Institutions::Name).string().not_null())
                    .col(ColumnDef::new(Institutions::OwnerId).string().not_null())
                    .col(
                        ColumnDef::new(Institutions::LicenseCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Institutions::OffersProfitSharing)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Institutions::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Institutions::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-institutions-owner_id")
                            .from(Institutions::Table, Institutions::OwnerId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Bank accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BankAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankAccounts::AccountNumber)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankAccounts::InstitutionId).integer().not_null())
                    .col(ColumnDef::new(BankAccounts::OwnerId).string().not_null())
                    .col(ColumnDef::new(BankAccounts::Kind).string().not_null())
                    .col(ColumnDef::new(BankAccounts::ProfitShareBps).integer())
                    .col(ColumnDef::new(BankAccounts::Currency).string().not_null())
                    .col(
                        ColumnDef::new(BankAccounts::Balance)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(BankAccounts::Balance).gte(0)),
                    )
                    .col(ColumnDef::new(BankAccounts::Status).string().not_null())
                    .col(ColumnDef::new(BankAccounts::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_accounts-institution_id")
                            .from(BankAccounts::Table, BankAccounts::InstitutionId)
                            .to(Institutions::Table, Institutions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_accounts-owner_id")
                            .from(BankAccounts::Table, BankAccounts::OwnerId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_accounts-owner_id")
                    .table(BankAccounts::Table)
                    .col(BankAccounts::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Bank delegates
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BankDelegates::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BankDelegates::AccountNumber).string().not_null())
                    .col(ColumnDef::new(BankDelegates::UserId).string().not_null())
                    .col(ColumnDef::new(BankDelegates::Role).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(BankDelegates::AccountNumber)
                            .col(BankDelegates::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_delegates-account_number")
                            .from(BankDelegates::Table, BankDelegates::AccountNumber)
                            .to(BankAccounts::Table, BankAccounts::AccountNumber)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_delegates-user_id")
                            .from(BankDelegates::Table, BankDelegates::UserId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Bank ledger entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BankLedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankLedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BankLedgerEntries::AccountNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankLedgerEntries::Kind).string().not_null())
                    .col(ColumnDef::new(BankLedgerEntries::Amount).big_integer().not_null())
                    .col(ColumnDef::new(BankLedgerEntries::Currency).string().not_null())
                    .col(
                        ColumnDef::new(BankLedgerEntries::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankLedgerEntries::CounterpartyAccount).string())
                    .col(ColumnDef::new(BankLedgerEntries::ActorId).string().not_null())
                    .col(
                        ColumnDef::new(BankLedgerEntries::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_ledger_entries-account_number")
                            .from(BankLedgerEntries::Table, BankLedgerEntries::AccountNumber)
                            .to(BankAccounts::Table, BankAccounts::AccountNumber),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_ledger_entries-counterparty_account")
                            .from(BankLedgerEntries::Table, BankLedgerEntries::CounterpartyAccount)
                            .to(BankAccounts::Table, BankAccounts::AccountNumber),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_ledger_entries-account_number-created_at")
                    .table(BankLedgerEntries::Table)
                    .col(BankLedgerEntries::AccountNumber)
                    .col(BankLedgerEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Businesses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Businesses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Businesses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Businesses::OwnerId).string().not_null())
                    .col(ColumnDef::new(Businesses::Kind).string().not_null())
                    .col(ColumnDef::new(Businesses::Cost).big_integer().not_null())
                    .col(ColumnDef::new(Businesses::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Businesses::ProfitPerPeriod)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Businesses::Status).string().not_null())
                    .col(
                        ColumnDef::new(Businesses::LastCollectedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Businesses::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-businesses-owner_id")
                            .from(Businesses::Table, Businesses::OwnerId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-businesses-owner_id")
                    .table(Businesses::Table)
                    .col(Businesses::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Investments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Investments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Investments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Investments::InvestorId).string().not_null())
                    .col(ColumnDef::new(Investments::BusinessId).integer().not_null())
                    .col(ColumnDef::new(Investments::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Investments::Currency).string().not_null())
                    .col(ColumnDef::new(Investments::Status).string().not_null())
                    .col(ColumnDef::new(Investments::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-investments-investor_id")
                            .from(Investments::Table, Investments::InvestorId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-investments-business_id")
                            .from(Investments::Table, Investments::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 11. Listings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Listings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Listings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Listings::SellerId).string().not_null())
                    .col(ColumnDef::new(Listings::Title).string().not_null())
                    .col(ColumnDef::new(Listings::Price).big_integer().not_null())
                    .col(ColumnDef::new(Listings::Currency).string().not_null())
                    .col(ColumnDef::new(Listings::Status).string().not_null())
                    .col(ColumnDef::new(Listings::BuyerId).string())
                    .col(ColumnDef::new(Listings::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-listings-seller_id")
                            .from(Listings::Table, Listings::SellerId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-listings-buyer_id")
                            .from(Listings::Table, Listings::BuyerId)
                            .to(Accounts::Table, Accounts::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-listings-status")
                    .table(Listings::Table)
                    .col(Listings::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Listings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Investments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Businesses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankLedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankDelegates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Institutions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Loans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoanApplications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
