use proptest::prelude::*;

use auditdesk_audits::AuditRecord;
use auditdesk_auth::{Principal, Scope};
use auditdesk_core::{AuditId, AuditStatus, CompanyId, Role, UserId};

use super::{AuditField, AuditFilter, AuditsView, ListQuery, Listable, SortDirection, SortState};

fn status() -> impl Strategy<Value = AuditStatus> {
    prop::sample::select(AuditStatus::ALL.to_vec())
}

fn rows() -> impl Strategy<Value = Vec<AuditRecord>> {
    prop::collection::vec(("[a-cA-C]{1,3}", 1u64..4, status(), 0u8..=100), 0..24).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (name, company, status, completion))| AuditRecord {
                id: AuditId::new(i as u64 + 1),
                name,
                company: CompanyId::new(company),
                company_name: None,
                expert: None,
                participant: None,
                status,
                completion,
                start_date: None,
                end_date: None,
                created_at: None,
                questions: Vec::new(),
                history: Vec::new(),
            })
            .collect()
    })
}

fn field() -> impl Strategy<Value = AuditField> {
    prop::sample::select(vec![AuditField::Name, AuditField::Status, AuditField::Completion])
}

fn build_query(field: AuditField, direction: SortDirection, search: String, status: Option<AuditStatus>) -> ListQuery<AuditRecord> {
    let mut query = ListQuery::new(SortState::new(field, direction));
    query.search = search;
    query.filter = AuditFilter {
        status,
        ..AuditFilter::default()
    };
    query
}

fn ids(rows: &[&AuditRecord]) -> Vec<AuditId> {
    rows.iter().map(|r| r.id).collect()
}

proptest! {
    #[test]
    fn pipeline_is_idempotent(
        rows in rows(),
        field in field(),
        search in "[abc]{0,2}",
        status in prop::option::of(status()),
    ) {
        let query = build_query(field, SortDirection::Ascending, search, status);
        let once = query.apply(&Scope::All, &rows);
        let twice = query.apply(&Scope::All, once.iter().copied());
        prop_assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn toggling_direction_reverses_the_key_sequence(rows in rows(), field in field()) {
        let asc = build_query(field, SortDirection::Ascending, String::new(), None);
        let desc = build_query(field, SortDirection::Descending, String::new(), None);

        let up: Vec<_> = asc.apply(&Scope::All, &rows).iter().map(|r| r.sort_key(field)).collect();
        let mut down: Vec<_> = desc.apply(&Scope::All, &rows).iter().map(|r| r.sort_key(field)).collect();
        down.reverse();
        prop_assert_eq!(up, down);
    }

    #[test]
    fn ties_keep_their_input_order(rows in rows()) {
        let sorted = build_query(AuditField::Status, SortDirection::Ascending, String::new(), None)
            .apply(&Scope::All, &rows);
        for pair in sorted.windows(2) {
            if pair[0].status == pair[1].status {
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }

    #[test]
    fn participants_only_see_their_company(rows in rows(), org in 1u64..4) {
        let principal = Principal::new(UserId::new(1), Role::Participant, Some(CompanyId::new(org)));
        let view = AuditsView::new(&principal, rows.clone(), SortState::new(AuditField::Name, SortDirection::Ascending));

        let visible = view.visible();
        prop_assert!(visible.iter().all(|r| r.company == CompanyId::new(org)));
        prop_assert_eq!(visible.len(), rows.iter().filter(|r| r.company == CompanyId::new(org)).count());
    }
}
