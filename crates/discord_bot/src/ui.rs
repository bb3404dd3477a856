//! Message rendering. Everything here is pure so it can be tested without a
//! gateway connection.

use chrono::{DateTime, Utc};
use engine::{
    BankAccount, BankAccountKind, BankLedgerEntry, Balances, BusinessSpec, BusinessView,
    Currency, Institution, LedgerEntry, Listing, Loan, LoanApplication, Money,
};

const EMPTY: &str = "Nothing here yet.";

pub(crate) fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

pub(crate) fn amount(value: Money, currency: Currency) -> String {
    let icon = match currency {
        Currency::Gold => "🟡",
        Currency::Silver => "⚪",
    };
    format!("{icon} {value} {currency}")
}

fn date(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn join_or_empty(lines: Vec<String>) -> String {
    if lines.is_empty() {
        EMPTY.to_string()
    } else {
        lines.join("\n")
    }
}

pub(crate) fn render_balances(user_id: &str, balances: &Balances) -> String {
    format!(
        "**Wallet of {}**\n{}\n{}",
        mention(user_id),
        amount(balances.gold, Currency::Gold),
        amount(balances.silver, Currency::Silver)
    )
}

pub(crate) fn render_history(entries: &[LedgerEntry]) -> String {
    join_or_empty(
        entries
            .iter()
            .map(|entry| {
                let counterparty = entry
                    .counterparty_id
                    .as_deref()
                    .map(|id| format!(" ({})", mention(id)))
                    .unwrap_or_default();
                format!(
                    "`{}` {} **{}** {}{}",
                    date(entry.created_at),
                    entry.kind,
                    amount(entry.amount, entry.currency),
                    entry.description,
                    counterparty
                )
            })
            .collect(),
    )
}

pub(crate) fn render_application(application: &LoanApplication) -> String {
    let purpose = application
        .purpose
        .as_deref()
        .map(|p| format!(" for \"{p}\""))
        .unwrap_or_default();
    format!(
        "Request **#{}** by {}: {} over {} day(s){}, due {} ({})",
        application.id,
        mention(&application.borrower_id),
        amount(application.amount, application.currency),
        application.term_days,
        purpose,
        date(application.due_date),
        application.status
    )
}

pub(crate) fn render_applications(applications: &[LoanApplication]) -> String {
    join_or_empty(applications.iter().map(render_application).collect())
}

pub(crate) fn render_loan(loan: &Loan) -> String {
    format!(
        "Loan **#{}**: {} lent {} to {}, repaid {}, due {} ({})",
        loan.id,
        mention(&loan.lender_id),
        amount(loan.principal, loan.currency),
        mention(&loan.borrower_id),
        loan.repaid_amount,
        date(loan.due_date),
        loan.status
    )
}

pub(crate) fn render_loans(loans: &[Loan]) -> String {
    join_or_empty(loans.iter().map(render_loan).collect())
}

pub(crate) fn render_institutions(institutions: &[Institution]) -> String {
    join_or_empty(
        institutions
            .iter()
            .map(|bank| {
                let mut flags = Vec::new();
                if bank.offers_profit_sharing {
                    flags.push("profit sharing");
                }
                if !bank.active {
                    flags.push("closed to new accounts");
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                };
                format!(
                    "**#{}** {} `{}` run by {}{}",
                    bank.id,
                    bank.name,
                    bank.license_code,
                    mention(&bank.owner_id),
                    flags
                )
            })
            .collect(),
    )
}

fn kind_label(kind: BankAccountKind) -> String {
    match kind {
        BankAccountKind::Custodial => "custodial".to_string(),
        BankAccountKind::ProfitSharing { ratio_bps } => {
            format!("profit sharing {}%", Money::new(i64::from(ratio_bps)))
        }
    }
}

pub(crate) fn render_bank_account(account: &BankAccount) -> String {
    format!(
        "`{}` at bank #{}: {} ({}, {})",
        account.account_number,
        account.institution_id,
        amount(account.balance, account.currency),
        kind_label(account.kind),
        account.status
    )
}

pub(crate) fn render_bank_accounts(accounts: &[BankAccount]) -> String {
    join_or_empty(accounts.iter().map(render_bank_account).collect())
}

pub(crate) fn render_statement(account_number: &str, entries: &[BankLedgerEntry]) -> String {
    let lines = entries
        .iter()
        .map(|entry| {
            let counterparty = entry
                .counterparty_account
                .as_deref()
                .map(|number| format!(" ↔ `{number}`"))
                .unwrap_or_default();
            format!(
                "`{}` {} **{}** by {}{}",
                date(entry.created_at),
                entry.kind,
                amount(entry.amount, entry.currency),
                mention(&entry.actor_id),
                counterparty
            )
        })
        .collect();
    format!("**Statement of `{account_number}`**\n{}", join_or_empty(lines))
}

pub(crate) fn render_catalog(catalog: &[BusinessSpec], period_hours: i64) -> String {
    let lines = catalog
        .iter()
        .map(|spec| {
            format!(
                "`{}` **{}**: costs {}, earns {} every {period_hours}h",
                spec.key,
                spec.name,
                amount(spec.cost, spec.currency),
                amount(spec.profit_per_period, spec.currency)
            )
        })
        .collect();
    join_or_empty(lines)
}

pub(crate) fn render_businesses(views: &[BusinessView]) -> String {
    join_or_empty(
        views
            .iter()
            .map(|view| {
                format!(
                    "**#{}** {}: earns {} per period, {} ready to collect",
                    view.business.id,
                    view.business.kind,
                    amount(view.business.profit_per_period, view.business.currency),
                    amount(view.pending_profit, view.business.currency)
                )
            })
            .collect(),
    )
}

pub(crate) fn render_listing(listing: &Listing) -> String {
    format!(
        "**#{}** {} for {} from {}",
        listing.id,
        listing.title,
        amount(listing.price, listing.currency),
        mention(&listing.seller_id)
    )
}

pub(crate) fn render_listings(listings: &[Listing]) -> String {
    join_or_empty(listings.iter().map(render_listing).collect())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use engine::{BankAccountStatus, BusinessStatus, EntryKind, LoanStatus};

    use super::*;

    fn entry(kind: EntryKind, minor: i64, counterparty: Option<&str>) -> LedgerEntry {
        LedgerEntry {
            id: uuid::Uuid::nil(),
            account_id: "1".to_string(),
            kind,
            amount: Money::new(minor),
            currency: Currency::Gold,
            description: "note".to_string(),
            counterparty_id: counterparty.map(ToString::to_string),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn balances_show_both_currencies() {
        let text = render_balances(
            "7",
            &Balances {
                gold: Money::new(12_345),
                silver: Money::ZERO,
            },
        );
        assert_eq!(text, "**Wallet of <@7>**\n🟡 123.45 gold\n⚪ 0.00 silver");
    }

    #[test]
    fn history_lines_mention_the_counterparty() {
        let text = render_history(&[
            entry(EntryKind::TransferSend, -500, Some("9")),
            entry(EntryKind::BusinessProfit, 200, None),
        ]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("`2026-03-01` transfer_send **🟡 -5.00 gold**"));
        assert!(lines[0].ends_with("(<@9>)"));
        assert!(!lines[1].contains("<@"));
    }

    #[test]
    fn empty_lists_say_so() {
        assert_eq!(render_history(&[]), EMPTY);
        assert_eq!(render_listings(&[]), EMPTY);
        assert_eq!(render_statement("ABC", &[]), format!("**Statement of `ABC`**\n{EMPTY}"));
    }

    #[test]
    fn loan_shows_progress() {
        let due = Utc.with_ymd_and_hms(2026, 4, 2, 0, 0, 0).unwrap();
        let loan = Loan {
            id: 3,
            application_id: 1,
            lender_id: "1".to_string(),
            borrower_id: "2".to_string(),
            principal: Money::from_major(40),
            currency: Currency::Silver,
            due_date: due,
            repaid_amount: Money::from_major(15),
            status: LoanStatus::Active,
            created_at: due,
        };
        assert_eq!(
            render_loan(&loan),
            "Loan **#3**: <@1> lent ⚪ 40.00 silver to <@2>, repaid 15.00, due 2026-04-02 (active)"
        );
    }

    #[test]
    fn profit_sharing_accounts_show_their_ratio() {
        let account = BankAccount {
            account_number: "AB12CD34EF".to_string(),
            institution_id: 2,
            owner_id: "1".to_string(),
            kind: BankAccountKind::ProfitSharing { ratio_bps: 1_250 },
            currency: Currency::Gold,
            balance: Money::from_major(5),
            status: BankAccountStatus::Open,
            created_at: Utc::now(),
        };
        assert_eq!(
            render_bank_account(&account),
            "`AB12CD34EF` at bank #2: 🟡 5.00 gold (profit sharing 12.50%, open)"
        );
    }

    #[test]
    fn businesses_show_pending_profit() {
        let now = Utc::now();
        let view = BusinessView {
            business: engine::Business {
                id: 4,
                owner_id: "1".to_string(),
                kind: "bakery".to_string(),
                cost: Money::from_major(200),
                currency: Currency::Gold,
                profit_per_period: Money::from_major(9),
                status: BusinessStatus::Active,
                last_collected_at: now,
                created_at: now,
            },
            pending_profit: Money::from_major(18),
        };
        assert_eq!(
            render_businesses(&[view]),
            "**#4** bakery: earns 🟡 9.00 gold per period, 🟡 18.00 gold ready to collect"
        );
    }
}
