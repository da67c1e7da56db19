//! Customers and suppliers, the two counterparty kinds a transaction can
//! reference. The ledger reads them for existence checks; removal is guarded
//! so committed history never points at a missing party.

use sled::{Db, Tree};

use crate::error::LedgerError;
use crate::ledger::{TRANSACTIONS_TREE, TransactionHeader, TransactionKind};
use crate::utils;

pub const CUSTOMERS_TREE: &str = "customers";
pub const SUPPLIERS_TREE: &str = "suppliers";

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    #[n(0)]
    pub id: String, // bech32, "cust_" prefix
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub email: Option<String>,
    #[n(3)]
    pub phone: Option<String>,
    #[n(4)]
    pub address: Option<String>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Supplier {
    #[n(0)]
    pub id: String, // bech32, "supp_" prefix
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub contact_person: Option<String>,
    #[n(3)]
    pub email: Option<String>,
    #[n(4)]
    pub phone: Option<String>,
}

pub struct PartyStore {
    customers: Tree,
    suppliers: Tree,
    // read-only here, used by the delete guards
    transactions: Tree,
    products: Tree,
}

impl PartyStore {
    pub fn new(db: &Db) -> Result<Self, LedgerError> {
        Ok(Self {
            customers: db.open_tree(CUSTOMERS_TREE)?,
            suppliers: db.open_tree(SUPPLIERS_TREE)?,
            transactions: db.open_tree(TRANSACTIONS_TREE)?,
            products: db.open_tree(crate::catalog::PRODUCTS_TREE)?,
        })
    }

    pub fn add_customer(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<Customer, LedgerError> {
        if name.trim().is_empty() {
            return Err(anyhow::Error::msg("customer name is not set").into());
        }

        let customer = Customer {
            id: utils::new_uuid_to_bech32("cust_")?,
            name: name.to_owned(),
            email: email.map(str::to_owned),
            phone: phone.map(str::to_owned),
            address: address.map(str::to_owned),
        };
        self.customers
            .insert(customer.id.as_bytes(), utils::to_cbor(&customer)?)?;
        Ok(customer)
    }

    pub fn add_supplier(
        &self,
        name: &str,
        contact_person: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Supplier, LedgerError> {
        if name.trim().is_empty() {
            return Err(anyhow::Error::msg("supplier name is not set").into());
        }

        let supplier = Supplier {
            id: utils::new_uuid_to_bech32("supp_")?,
            name: name.to_owned(),
            contact_person: contact_person.map(str::to_owned),
            email: email.map(str::to_owned),
            phone: phone.map(str::to_owned),
        };
        self.suppliers
            .insert(supplier.id.as_bytes(), utils::to_cbor(&supplier)?)?;
        Ok(supplier)
    }

    pub fn customer(&self, customer_id: &str) -> Result<Option<Customer>, LedgerError> {
        let Some(bytes) = self.customers.get(customer_id.as_bytes())? else {
            return Ok(None);
        };
        Ok(Some(utils::from_cbor(&bytes)?))
    }

    pub fn supplier(&self, supplier_id: &str) -> Result<Option<Supplier>, LedgerError> {
        let Some(bytes) = self.suppliers.get(supplier_id.as_bytes())? else {
            return Ok(None);
        };
        Ok(Some(utils::from_cbor(&bytes)?))
    }

    /// All customers, ordered by name.
    pub fn customers(&self) -> Result<Vec<Customer>, LedgerError> {
        let mut customers = Vec::new();
        for entry in self.customers.iter() {
            let (_, value) = entry?;
            customers.push(utils::from_cbor::<Customer>(&value)?);
        }
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    /// All suppliers, ordered by name.
    pub fn suppliers(&self) -> Result<Vec<Supplier>, LedgerError> {
        let mut suppliers = Vec::new();
        for entry in self.suppliers.iter() {
            let (_, value) = entry?;
            suppliers.push(utils::from_cbor::<Supplier>(&value)?);
        }
        suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suppliers)
    }

    /// Whether the id resolves in the party store the kind selects:
    /// customers for sales, suppliers for purchases.
    pub fn counterparty_exists(
        &self,
        kind: TransactionKind,
        party_id: &str,
    ) -> Result<bool, LedgerError> {
        let tree = match kind {
            TransactionKind::Sale => &self.customers,
            TransactionKind::Purchase => &self.suppliers,
        };
        Ok(tree.get(party_id.as_bytes())?.is_some())
    }

    /// Remove a customer, unless committed sales reference them.
    pub fn remove_customer(&self, customer_id: &str) -> Result<(), LedgerError> {
        if self.customer(customer_id)?.is_none() {
            return Err(LedgerError::UnknownCounterparty {
                party_id: customer_id.to_owned(),
            });
        }
        if self.referenced_by_transactions(customer_id)? {
            return Err(LedgerError::CounterpartyInUse {
                party_id: customer_id.to_owned(),
            });
        }
        self.customers.remove(customer_id.as_bytes())?;
        Ok(())
    }

    /// Remove a supplier, unless committed purchases or catalog products
    /// reference them.
    pub fn remove_supplier(&self, supplier_id: &str) -> Result<(), LedgerError> {
        if self.supplier(supplier_id)?.is_none() {
            return Err(LedgerError::UnknownCounterparty {
                party_id: supplier_id.to_owned(),
            });
        }
        if self.referenced_by_transactions(supplier_id)? || self.supplies_products(supplier_id)? {
            return Err(LedgerError::CounterpartyInUse {
                party_id: supplier_id.to_owned(),
            });
        }
        self.suppliers.remove(supplier_id.as_bytes())?;
        Ok(())
    }

    fn referenced_by_transactions(&self, party_id: &str) -> Result<bool, LedgerError> {
        for entry in self.transactions.iter() {
            let (_, value) = entry?;
            let header: TransactionHeader = utils::from_cbor(&value)?;
            if header.counterparty_id == party_id {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn supplies_products(&self, supplier_id: &str) -> Result<bool, LedgerError> {
        for entry in self.products.iter() {
            let (_, value) = entry?;
            let product: crate::catalog::Product = utils::from_cbor(&value)?;
            if product.supplier_id.as_deref() == Some(supplier_id) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
