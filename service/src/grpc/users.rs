// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! gRPC service to manipulate users.

use crate::driver::Driver;
use crate::grpc::driver_error_to_status;
use crate::grpc::proto::user_service_server::UserService;
use crate::grpc::proto::{self, CreateUserRequest, DeleteResponse, UserRequest};
use crate::model::UserId;
use tonic::{Request, Response, Status};

/// Implementation of the `UserService` backed by the business logic.
pub(crate) struct UserServiceImpl {
    /// The business logic to delegate operations to.
    driver: Driver,
}

impl UserServiceImpl {
    /// Creates a new service backed by `driver`.
    pub(crate) fn new(driver: Driver) -> Self {
        Self { driver }
    }
}

#[tonic::async_trait]
impl UserService for UserServiceImpl {
    async fn get_users(&self, _request: Request<()>) -> Result<Response<proto::Users>, Status> {
        let users = self.driver.clone().get_users().await.map_err(driver_error_to_status)?;
        let users = users.into_iter().map(proto::User::from).collect();
        Ok(Response::new(proto::Users { users }))
    }

    async fn get_user(
        &self,
        request: Request<UserRequest>,
    ) -> Result<Response<proto::User>, Status> {
        let id = UserId::from(request.into_inner().id);
        let user = self.driver.clone().get_user(id).await.map_err(driver_error_to_status)?;
        Ok(Response::new(proto::User::from(user)))
    }

    async fn create_user(
        &self,
        request: Request<CreateUserRequest>,
    ) -> Result<Response<proto::User>, Status> {
        let request = request.into_inner();
        let user = self
            .driver
            .clone()
            .create_user(request.name, request.email)
            .await
            .map_err(driver_error_to_status)?;
        Ok(Response::new(proto::User::from(user)))
    }

    async fn delete_user(
        &self,
        request: Request<UserRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        let id = UserId::from(request.into_inner().id);
        self.driver.clone().delete_user(id).await.map_err(driver_error_to_status)?;
        Ok(Response::new(DeleteResponse {
            success: true,
            message: format!("User with ID {} successfully deleted", id),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grpc::testutils::*;
    use tonic::Code;

    #[tokio::test]
    async fn test_get_users() {
        let context = TestContext::setup().await;
        let service = UserServiceImpl::new(context.driver());

        let response = service.get_users(Request::new(())).await.unwrap().into_inner();
        assert!(response.users.is_empty());

        let alice = context.create_user("Alice", "alice@example.com").await;
        let bob = context.create_user("Bob", "bob@example.com").await;

        let response = service.get_users(Request::new(())).await.unwrap().into_inner();
        assert_eq!(vec![proto::User::from(alice), proto::User::from(bob)], response.users);
    }

    #[tokio::test]
    async fn test_get_user() {
        let context = TestContext::setup().await;
        let service = UserServiceImpl::new(context.driver());

        let alice = context.create_user("Alice", "alice@example.com").await;

        let request = Request::new(UserRequest { id: alice.id().as_i32() });
        let response = service.get_user(request).await.unwrap().into_inner();
        assert_eq!(proto::User::from(alice), response);

        let status = service.get_user(Request::new(UserRequest { id: 999 })).await.unwrap_err();
        assert_eq!(Code::NotFound, status.code());
        assert_eq!("User with ID 999 not found", status.message());
    }

    #[tokio::test]
    async fn test_create_user() {
        let context = TestContext::setup().await;
        let service = UserServiceImpl::new(context.driver());

        let request = Request::new(CreateUserRequest {
            name: "Alice".to_owned(),
            email: "alice@example.com".to_owned(),
        });
        let response = service.create_user(request).await.unwrap().into_inner();
        assert_eq!("Alice", response.name);
        assert_eq!("alice@example.com", response.email);
        assert_eq!(100000, response.created_at.unwrap().seconds);

        assert_eq!(vec![response.id], context.user_ids().await);
    }

    #[tokio::test]
    async fn test_create_user_errors() {
        let context = TestContext::setup().await;
        let service = UserServiceImpl::new(context.driver());

        context.create_user("Alice", "alice@example.com").await;

        for (name, email, code, message) in [
            (
                "Alice",
                "alice@example.com",
                Code::AlreadyExists,
                "User with email='alice@example.com' already exists",
            ),
            ("Bob", "bob", Code::InvalidArgument, "Invalid email format: bob"),
            ("", "bob@example.com", Code::InvalidArgument, "Name cannot be empty"),
        ] {
            let request = Request::new(CreateUserRequest {
                name: name.to_owned(),
                email: email.to_owned(),
            });
            let status = service.create_user(request).await.unwrap_err();
            assert_eq!(code, status.code());
            assert_eq!(message, status.message());
        }

        assert_eq!(1, context.user_ids().await.len());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let context = TestContext::setup().await;
        let service = UserServiceImpl::new(context.driver());

        let alice = context.create_user("Alice", "alice@example.com").await;
        let id = alice.id().as_i32();

        let response = service.delete_user(Request::new(UserRequest { id })).await.unwrap();
        assert_eq!(
            DeleteResponse {
                success: true,
                message: format!("User with ID {} successfully deleted", id),
            },
            response.into_inner()
        );
        assert!(context.user_ids().await.is_empty());

        let status = service.delete_user(Request::new(UserRequest { id })).await.unwrap_err();
        assert_eq!(Code::NotFound, status.code());
        assert_eq!(format!("User with ID {} not found", id), status.message());
    }
}
