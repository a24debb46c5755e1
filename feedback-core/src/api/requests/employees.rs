//! REST ⟶ /employees

use feedback_common::models::{ApiResponse, Employee, EmployeeUpdate, Entity, NewEmployee};
use feedback_common::traits::Validate;

use crate::api::client::{RequestOptions, SecureApiClient};
use crate::api::query::StrapiQuery;
use crate::Error;

impl SecureApiClient {
    pub async fn list_employees(&self, restaurant_id: i64) -> Result<Vec<Entity<Employee>>, Error> {
        let query = StrapiQuery::new()
            .eq("restaurant.id", restaurant_id)
            .sort("name:asc")
            .page(1, super::MAX_PAGE_SIZE);
        let resp: ApiResponse<Vec<Entity<Employee>>> =
            self.fetch("/employees", RequestOptions::get().query(query)).await?;
        Ok(resp.data)
    }

    pub async fn create_employee(&self, employee: &NewEmployee) -> Result<Entity<Employee>, Error> {
        let as_record = Employee {
            name: employee.name.clone(),
            role: employee.role.clone(),
            restaurant: Some(employee.restaurant.into()),
            active: employee.active,
        };
        as_record.validate().map_err(Error::Validation)?;
        let resp: ApiResponse<Entity<Employee>> =
            self.fetch("/employees", RequestOptions::post(employee)?).await?;
        Ok(resp.data)
    }

    pub async fn update_employee(&self, employee_id: i64, update: &EmployeeUpdate) -> Result<Entity<Employee>, Error> {
        let resp: ApiResponse<Entity<Employee>> = self
            .fetch(&format!("/employees/{employee_id}"), RequestOptions::put(update)?)
            .await?;
        Ok(resp.data)
    }

    pub async fn set_employee_active(&self, employee_id: i64, active: bool) -> Result<Entity<Employee>, Error> {
        let update = EmployeeUpdate {
            active: Some(active),
            ..Default::default()
        };
        self.update_employee(employee_id, &update).await
    }
}
