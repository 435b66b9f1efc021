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

//! gRPC service to manipulate orders.

use crate::driver::Driver;
use crate::grpc::driver_error_to_status;
use crate::grpc::proto::order_service_server::OrderService;
use crate::grpc::proto::{self, CreateOrderRequest, DeleteResponse, OrderRequest, UserRequest};
use crate::model::{Order, OrderId, UserId};
use tonic::{Request, Response, Status};

/// Implementation of the `OrderService` backed by the business logic.
pub(crate) struct OrderServiceImpl {
    /// The business logic to delegate operations to.
    driver: Driver,
}

impl OrderServiceImpl {
    /// Creates a new service backed by `driver`.
    pub(crate) fn new(driver: Driver) -> Self {
        Self { driver }
    }
}

/// Wraps a list of `orders` into their protobuf representation.
fn orders_to_proto(orders: Vec<Order>) -> proto::Orders {
    proto::Orders { orders: orders.into_iter().map(proto::Order::from).collect() }
}

#[tonic::async_trait]
impl OrderService for OrderServiceImpl {
    async fn get_orders(&self, _request: Request<()>) -> Result<Response<proto::Orders>, Status> {
        let orders = self.driver.clone().get_orders().await.map_err(driver_error_to_status)?;
        Ok(Response::new(orders_to_proto(orders)))
    }

    async fn get_order(
        &self,
        request: Request<OrderRequest>,
    ) -> Result<Response<proto::Order>, Status> {
        let id = OrderId::from(request.into_inner().id);
        let order = self.driver.clone().get_order(id).await.map_err(driver_error_to_status)?;
        Ok(Response::new(proto::Order::from(order)))
    }

    async fn get_orders_by_user(
        &self,
        request: Request<UserRequest>,
    ) -> Result<Response<proto::Orders>, Status> {
        let user_id = UserId::from(request.into_inner().id);
        let orders = self
            .driver
            .clone()
            .get_orders_by_user(user_id)
            .await
            .map_err(driver_error_to_status)?;
        Ok(Response::new(orders_to_proto(orders)))
    }

    async fn create_order(
        &self,
        request: Request<CreateOrderRequest>,
    ) -> Result<Response<proto::Order>, Status> {
        let request = request.into_inner();
        // Floats render without exponents, which is what the price parser expects.
        let price = format!("{}", request.price);
        let order = self
            .driver
            .clone()
            .create_order(UserId::from(request.user_id), request.product_name, &price)
            .await
            .map_err(driver_error_to_status)?;
        Ok(Response::new(proto::Order::from(order)))
    }

    async fn delete_order(
        &self,
        request: Request<OrderRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        let id = OrderId::from(request.into_inner().id);
        self.driver.clone().delete_order(id).await.map_err(driver_error_to_status)?;
        Ok(Response::new(DeleteResponse {
            success: true,
            message: format!("Order with ID {} successfully deleted", id),
        }))
    }
}
