//! SQL for the server-side pieces the repositories rely on.
//!
//! The hosted project owns its tables; these migrations add the
//! allocation history table and the two procedures that update
//! denormalized counters in one transaction. The in-process engine
//! implements the same procedures natively.

// -----------------------------------------------------------------------
// Migration list
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "beneficiary_allocations",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "counter_procedures",
        sql: SCHEMA_V2,
    },
    Migration {
        version: 3,
        name: "release_beneficiary",
        sql: SCHEMA_V3,
    },
];

/// Names of the procedures the repositories call through `rpc`.
pub const PROCEDURES: &[&str] = &[
    "allocate_beneficiary",
    "adjust_product_stock",
    "release_beneficiary",
];

// -----------------------------------------------------------------------
// v1: allocation history
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
CREATE TABLE IF NOT EXISTS public.beneficiary_allocations (
    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id uuid REFERENCES public.organizations(id) ON DELETE CASCADE,
    beneficiary_id uuid NOT NULL REFERENCES public.beneficiaries(id) ON DELETE CASCADE,
    housing_id uuid NOT NULL REFERENCES public.housing(id),
    room_id uuid NOT NULL REFERENCES public.housing_rooms(id),
    old_housing_id uuid REFERENCES public.housing(id),
    old_room_id uuid REFERENCES public.housing_rooms(id),
    type text NOT NULL DEFAULT 'ALLOCATION'
        CHECK (type IN ('ALLOCATION', 'REALLOCATION')),
    created_at timestamptz NOT NULL DEFAULT now(),
    updated_at timestamptz NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_allocations_beneficiary
    ON public.beneficiary_allocations (beneficiary_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_allocations_housing
    ON public.beneficiary_allocations (housing_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_allocations_room
    ON public.beneficiary_allocations (room_id);
ALTER TABLE public.beneficiary_allocations ENABLE ROW LEVEL SECURITY;
";

// -----------------------------------------------------------------------
// v2: counter procedures
// -----------------------------------------------------------------------

const SCHEMA_V2: &str = "\
CREATE OR REPLACE FUNCTION public.allocate_beneficiary(
    beneficiary_id uuid,
    housing_id uuid,
    room_id uuid,
    type text DEFAULT 'ALLOCATION'
) RETURNS public.beneficiary_allocations
LANGUAGE plpgsql AS $$
DECLARE
    b public.beneficiaries%ROWTYPE;
    r public.housing_rooms%ROWTYPE;
    result public.beneficiary_allocations%ROWTYPE;
BEGIN
    SELECT * INTO b FROM public.beneficiaries
        WHERE id = allocate_beneficiary.beneficiary_id FOR UPDATE;
    IF NOT FOUND THEN
        RAISE EXCEPTION 'beneficiary % not found', allocate_beneficiary.beneficiary_id;
    END IF;

    SELECT * INTO r FROM public.housing_rooms
        WHERE id = allocate_beneficiary.room_id
          AND housing_rooms.housing_id = allocate_beneficiary.housing_id
        FOR UPDATE;
    IF NOT FOUND THEN
        RAISE EXCEPTION 'room % not found in housing %',
            allocate_beneficiary.room_id, allocate_beneficiary.housing_id;
    END IF;
    IF b.current_room_id = r.id THEN
        RAISE EXCEPTION 'beneficiary already occupies this room';
    END IF;
    IF r.occupied >= r.capacity THEN
        RAISE EXCEPTION 'room % is full', r.id;
    END IF;

    IF b.current_room_id IS NOT NULL THEN
        UPDATE public.housing_rooms SET occupied = greatest(occupied - 1, 0),
            updated_at = now() WHERE id = b.current_room_id;
    END IF;
    IF b.current_housing_id IS NOT NULL THEN
        UPDATE public.housing SET occupied_vacancies = greatest(occupied_vacancies - 1, 0),
            updated_at = now() WHERE id = b.current_housing_id;
    END IF;
    UPDATE public.housing_rooms SET occupied = occupied + 1, updated_at = now()
        WHERE id = r.id;
    UPDATE public.housing SET occupied_vacancies = occupied_vacancies + 1,
        updated_at = now() WHERE id = allocate_beneficiary.housing_id;
    UPDATE public.beneficiaries SET current_housing_id = allocate_beneficiary.housing_id,
        current_room_id = r.id, updated_at = now() WHERE id = b.id;

    INSERT INTO public.beneficiary_allocations (organization_id, beneficiary_id,
        housing_id, room_id, old_housing_id, old_room_id, type)
    VALUES (b.organization_id, b.id, allocate_beneficiary.housing_id, r.id,
        b.current_housing_id, b.current_room_id, allocate_beneficiary.type)
    RETURNING * INTO result;
    RETURN result;
END;
$$;

CREATE OR REPLACE FUNCTION public.adjust_product_stock(
    product_type_id uuid,
    delta integer
) RETURNS json
LANGUAGE plpgsql AS $$
DECLARE
    total integer;
BEGIN
    UPDATE public.product_types
        SET total_in_storage = total_in_storage + delta, updated_at = now()
        WHERE id = adjust_product_stock.product_type_id
        RETURNING total_in_storage INTO total;
    IF NOT FOUND THEN
        RAISE EXCEPTION 'product type % not found', adjust_product_stock.product_type_id;
    END IF;
    IF total < 0 THEN
        RAISE EXCEPTION 'insufficient stock';
    END IF;
    RETURN json_build_object('product_type_id', adjust_product_stock.product_type_id,
        'total_in_storage', total);
END;
$$;
";

// -----------------------------------------------------------------------
// v3: releasing a placement
// -----------------------------------------------------------------------

const SCHEMA_V3: &str = "\
CREATE OR REPLACE FUNCTION public.release_beneficiary(
    beneficiary_id uuid
) RETURNS json
LANGUAGE plpgsql AS $$
DECLARE
    b public.beneficiaries%ROWTYPE;
BEGIN
    SELECT * INTO b FROM public.beneficiaries
        WHERE id = release_beneficiary.beneficiary_id FOR UPDATE;
    IF NOT FOUND OR b.current_room_id IS NULL THEN
        RETURN json_build_object('beneficiary_id', release_beneficiary.beneficiary_id,
            'released', false);
    END IF;

    UPDATE public.housing_rooms SET occupied = greatest(occupied - 1, 0),
        updated_at = now() WHERE id = b.current_room_id;
    IF b.current_housing_id IS NOT NULL THEN
        UPDATE public.housing SET occupied_vacancies = greatest(occupied_vacancies - 1, 0),
            updated_at = now() WHERE id = b.current_housing_id;
    END IF;
    UPDATE public.beneficiaries SET current_housing_id = NULL, current_room_id = NULL,
        updated_at = now() WHERE id = b.id;
    RETURN json_build_object('beneficiary_id', b.id, 'released', true);
END;
$$;
";

pub fn migrations() -> &'static [Migration] {
    MIGRATIONS
}

/// Returns the raw DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

/// All migrations as one script, each preceded by a version banner.
pub fn migration_script() -> String {
    MIGRATIONS
        .iter()
        .map(|m| format!("-- v{}: {}\n{}", m.version, m.name, m.sql))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(schema_v1().contains("beneficiary_allocations"));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn every_procedure_is_defined() {
        let script = migration_script();
        for name in PROCEDURES {
            assert!(
                script.contains(&format!("FUNCTION public.{name}(")),
                "missing procedure {name}"
            );
        }
    }
}
